//! E2E tests for effect execution during ticks.

use std::sync::Arc;

use booker_domain::{BranchStatus, BranchType, EffectType, FAILURE_MARKER};

use super::{E2ETestContext, RecordingHandler};
use crate::infrastructure::ports::{EffectError, MockEffectHandler};

/// A failing handler still leaves the branch activated and the effect executed.
#[tokio::test]
async fn test_failed_effect_does_not_block_activation() {
    let ctx = E2ETestContext::setup();
    let manage = &ctx.app.use_cases.storyline.manage;

    let mut failing = MockEffectHandler::new();
    failing
        .expect_execute()
        .times(1)
        .returning(|_, _, _| Err(EffectError::failed("title not found")));
    ctx.handlers
        .register(EffectType::new("TITLE_SHOT").unwrap(), Arc::new(failing));

    let branch = ctx.create_branch("Shot at the belt", BranchType::TitleChange, 0).await;
    manage
        .add_effect(branch.id(), "TITLE_SHOT", "title:world", "vega", None, 1)
        .await
        .unwrap();

    let report = ctx.app.use_cases.storyline.tick.execute().await.unwrap();

    assert_eq!(report.activations.len(), 1);
    let effects = &report.activations[0].effects;
    assert_eq!(effects.failure_count(), 1);
    assert!(!effects.outcomes[0].succeeded);
    assert!(report
        .outcome_log()
        .iter()
        .any(|line| line.contains("title not found")));

    let stored = ctx.reload(&branch).await;
    assert_eq!(stored.status(), BranchStatus::Activated);
    let effect = &stored.effects()[0];
    assert!(effect.is_executed());
    assert!(!effect.was_executed_successfully());
    assert!(effect
        .execution_result()
        .is_some_and(|r| r.starts_with(FAILURE_MARKER) && r.contains("title not found")));

    // Failed effects are not retried by later ticks
    ctx.advance_hours(1);
    let report = ctx.app.use_cases.storyline.tick.execute().await.unwrap();
    assert!(report.resumed.is_empty());
}

#[tokio::test]
async fn test_effects_run_in_execution_order() {
    let ctx = E2ETestContext::setup();
    let manage = &ctx.app.use_cases.storyline.manage;

    let recorder = Arc::new(RecordingHandler::default());
    ctx.handlers
        .register(EffectType::new("ADD_HEAT").unwrap(), recorder.clone());

    let branch = ctx.create_branch("Slow burn", BranchType::RivalryEscalation, 0).await;
    for (key, order) in [("third", 3), ("first", 1), ("second", 2)] {
        manage
            .add_effect(branch.id(), "ADD_HEAT", key, "10", None, order)
            .await
            .unwrap();
    }

    let report = ctx.app.use_cases.storyline.tick.execute().await.unwrap();

    assert_eq!(recorder.calls(), vec!["first", "second", "third"]);
    let orders: Vec<u32> = report.activations[0]
        .effects
        .outcomes
        .iter()
        .map(|o| o.execution_order)
        .collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

/// Equal orders fall back to the effect type's execution priority.
#[tokio::test]
async fn test_equal_orders_run_higher_priority_types_first() {
    let ctx = E2ETestContext::setup();
    let manage = &ctx.app.use_cases.storyline.manage;

    let branch = ctx.create_branch("Big night", BranchType::MatchOutcome, 0).await;
    manage
        .add_effect(branch.id(), "CREATE_STORYLINE", "story:next", "open", None, 1)
        .await
        .unwrap();
    manage
        .add_effect(branch.id(), "CREATE_RIVALRY", "rivalry:next", "open", None, 1)
        .await
        .unwrap();

    let report = ctx.app.use_cases.storyline.tick.execute().await.unwrap();

    let types: Vec<String> = report.activations[0]
        .effects
        .outcomes
        .iter()
        .map(|o| o.effect_type.to_string())
        .collect();
    assert_eq!(types, vec!["CREATE_RIVALRY", "CREATE_STORYLINE"]);
}

/// A lower-order failure doesn't stop higher-order effects.
#[tokio::test]
async fn test_later_effects_run_after_a_failure() {
    let ctx = E2ETestContext::setup();
    let manage = &ctx.app.use_cases.storyline.manage;

    let branch = ctx.create_branch("Messy angle", BranchType::DramaResponse, 0).await;
    manage
        .add_effect(branch.id(), "STORYLINE_TWIST", "  ", "heel turn", None, 1)
        .await
        .unwrap();
    manage
        .add_effect(branch.id(), "CHANGE_ALIGNMENT", "alignment:cole", "heel", None, 2)
        .await
        .unwrap();

    let report = ctx.app.use_cases.storyline.tick.execute().await.unwrap();

    let effects = &report.activations[0].effects;
    assert_eq!(effects.failure_count(), 1);
    assert_eq!(effects.success_count(), 1);
    assert_eq!(ctx.facts.get("alignment:cole").as_deref(), Some("heel"));
    assert!(!ctx.reload(&branch).await.has_pending_effects());
}

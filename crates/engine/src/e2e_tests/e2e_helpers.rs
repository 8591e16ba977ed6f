//! Shared setup for E2E tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use booker_domain::{BranchType, ConditionType, EffectType, StorylineBranch};
use chrono::{DateTime, TimeZone, Utc};

use crate::infrastructure::clock::ManualClock;
use crate::infrastructure::facts::{FactBook, FactEffectHandler, FactEvaluator};
use crate::infrastructure::memory::InMemoryBranchRepo;
use crate::infrastructure::ports::{BranchRepo, EffectError, EffectHandler};
use crate::infrastructure::registry::{EvaluatorRegistry, HandlerRegistry};
use crate::App;

pub fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Fully wired app over in-memory state.
pub struct E2ETestContext {
    pub app: App,
    pub repo: Arc<InMemoryBranchRepo>,
    pub facts: Arc<FactBook>,
    pub clock: Arc<ManualClock>,
    pub handlers: Arc<HandlerRegistry>,
}

impl E2ETestContext {
    pub fn setup() -> Self {
        let repo = Arc::new(InMemoryBranchRepo::new());
        let facts = Arc::new(FactBook::new());
        let clock = Arc::new(ManualClock::new(start_time()));

        let evaluators =
            EvaluatorRegistry::new().with_fallback(Arc::new(FactEvaluator::exact(facts.clone())));
        evaluators.register(
            ConditionType::new("HEAT_THRESHOLD").unwrap(),
            Arc::new(FactEvaluator::at_least(facts.clone())),
        );
        let handlers = Arc::new(
            HandlerRegistry::new().with_fallback(Arc::new(FactEffectHandler::new(facts.clone()))),
        );

        let app = App::new(
            repo.clone(),
            Arc::new(evaluators),
            handlers.clone(),
            clock.clone(),
        );

        Self {
            app,
            repo,
            facts,
            clock,
            handlers,
        }
    }

    pub fn advance_hours(&self, hours: i64) {
        self.clock.advance(chrono::Duration::hours(hours));
    }

    /// Create a branch through the management use case.
    pub async fn create_branch(&self, name: &str, branch_type: BranchType, priority: i32) -> StorylineBranch {
        self.app
            .use_cases
            .storyline
            .manage
            .create_branch(name, "", branch_type, priority)
            .await
            .expect("Creating branch should succeed")
    }

    pub async fn reload(&self, branch: &StorylineBranch) -> StorylineBranch {
        self.repo
            .get(branch.id())
            .await
            .expect("Repo read should succeed")
            .expect("Branch should exist")
    }
}

/// Effect handler that remembers the keys it was asked to act on.
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EffectHandler for RecordingHandler {
    async fn execute(
        &self,
        effect_type: &EffectType,
        key: &str,
        _value: &str,
    ) -> Result<String, EffectError> {
        self.calls.lock().unwrap().push(key.to_string());
        Ok(format!("{} handled {}", effect_type, key))
    }
}

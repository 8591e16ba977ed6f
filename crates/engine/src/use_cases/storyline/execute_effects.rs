//! Execute branch effects use case.
//!
//! Runs every pending effect of a branch once, in execution order, through the
//! external effect handler. A handler failure is recorded on the effect (it
//! still counts as executed) and the pipeline moves on to the next effect.
//! Nothing is rolled back.

use std::sync::Arc;

use booker_domain::{EffectId, EffectType, StorylineBranch};
use chrono::{DateTime, Utc};

use crate::infrastructure::ports::{ClockPort, EffectHandler};

/// Result of executing a single effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectOutcome {
    pub effect_id: EffectId,
    pub effect_type: EffectType,
    pub execution_order: u32,
    pub executed_at: DateTime<Utc>,
    pub succeeded: bool,
    /// Outcome text as stored on the effect
    pub result: String,
}

impl EffectOutcome {
    pub fn log_line(&self) -> String {
        format!(
            "#{} {}: {}",
            self.execution_order, self.effect_type, self.result
        )
    }
}

/// Ordered outcomes of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectPipelineReport {
    pub outcomes: Vec<EffectOutcome>,
}

impl EffectPipelineReport {
    /// True when the run had nothing left to execute.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    /// One line per effect, in execution order.
    pub fn log(&self) -> Vec<String> {
        self.outcomes.iter().map(EffectOutcome::log_line).collect()
    }
}

struct PendingEffect {
    id: EffectId,
    effect_type: EffectType,
    execution_order: u32,
    key: String,
    value: String,
}

pub struct ExecuteEffects {
    handler: Arc<dyn EffectHandler>,
    clock: Arc<dyn ClockPort>,
}

impl ExecuteEffects {
    pub fn new(handler: Arc<dyn EffectHandler>, clock: Arc<dyn ClockPort>) -> Self {
        Self { handler, clock }
    }

    /// Execute the branch's pending effects. Already-executed effects are skipped,
    /// so a second run over a fully executed branch returns an empty report.
    #[tracing::instrument(skip(self, branch), fields(branch_id = %branch.id()))]
    pub async fn execute(&self, branch: &mut StorylineBranch) -> EffectPipelineReport {
        let pending: Vec<PendingEffect> = branch
            .pending_effects_in_order()
            .into_iter()
            .map(|e| PendingEffect {
                id: e.id(),
                effect_type: e.effect_type().clone(),
                execution_order: e.execution_order(),
                key: e.key().to_string(),
                value: e.value().to_string(),
            })
            .collect();

        let mut report = EffectPipelineReport::default();
        // Order is advisory: later effects still run after an earlier failure
        for effect in pending {
            let result = self
                .handler
                .execute(&effect.effect_type, &effect.key, &effect.value)
                .await;
            let now = self.clock.now();

            let (recorded, succeeded) = match result {
                Ok(text) => {
                    tracing::info!(
                        branch_id = %branch.id(),
                        effect_type = %effect.effect_type,
                        "Effect executed"
                    );
                    (branch.record_effect_success(effect.id, text, now), true)
                }
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        branch_id = %branch.id(),
                        effect_type = %effect.effect_type,
                        execution_order = effect.execution_order,
                        "Effect failed, marking executed"
                    );
                    (branch.record_effect_failure(effect.id, &error, now), false)
                }
            };

            match recorded {
                Ok(true) => report.outcomes.push(EffectOutcome {
                    result: branch
                        .effect(effect.id)
                        .and_then(|e| e.execution_result())
                        .unwrap_or_default()
                        .to_string(),
                    effect_id: effect.id,
                    effect_type: effect.effect_type,
                    execution_order: effect.execution_order,
                    executed_at: now,
                    succeeded,
                }),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, effect_id = %effect.id, "Could not record effect outcome");
                }
            }
        }

        report
    }
}

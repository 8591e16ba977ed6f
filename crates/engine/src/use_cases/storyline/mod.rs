//! Storyline use cases - condition evaluation, activation, effects, ticks and management.

pub mod activate;
pub mod evaluate_conditions;
pub mod execute_effects;
pub mod manage;
pub mod tick;

pub use activate::{ActivateBranch, ActivationOutcome};
pub use evaluate_conditions::{ConditionCheckReport, ConditionWarning, EvaluateConditions};
pub use execute_effects::{EffectOutcome, EffectPipelineReport, ExecuteEffects};
pub use manage::{BranchStatistics, ManageBranches, ManagementError, SegmentOutcomeReport};
pub use tick::{BranchEffectsRun, RunTick, SaveFailure, StatusTransition, TickError, TickReport};

use std::sync::Arc;

/// Container for storyline use cases.
pub struct StorylineUseCases {
    pub evaluate_conditions: Arc<EvaluateConditions>,
    pub execute_effects: Arc<ExecuteEffects>,
    pub activate: Arc<ActivateBranch>,
    pub tick: Arc<RunTick>,
    pub manage: Arc<ManageBranches>,
}

impl StorylineUseCases {
    pub fn new(
        evaluate_conditions: Arc<EvaluateConditions>,
        execute_effects: Arc<ExecuteEffects>,
        activate: Arc<ActivateBranch>,
        tick: Arc<RunTick>,
        manage: Arc<ManageBranches>,
    ) -> Self {
        Self {
            evaluate_conditions,
            execute_effects,
            activate,
            tick,
            manage,
        }
    }
}

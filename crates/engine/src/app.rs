//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::ports::{BranchRepo, ClockPort, ConditionEvaluator, EffectHandler};
use crate::use_cases;
use crate::use_cases::storyline::{
    ActivateBranch, EvaluateConditions, ExecuteEffects, ManageBranches, RunTick,
};

/// Main application state.
///
/// Holds the repository ports and every use case wired against them.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Container for repository ports.
pub struct Repositories {
    pub branch: Arc<dyn BranchRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub storyline: use_cases::StorylineUseCases,
}

impl App {
    /// Wire use cases against the given ports.
    pub fn new(
        branch_repo: Arc<dyn BranchRepo>,
        evaluator: Arc<dyn ConditionEvaluator>,
        handler: Arc<dyn EffectHandler>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let evaluate_conditions = Arc::new(EvaluateConditions::new(evaluator));
        let execute_effects = Arc::new(ExecuteEffects::new(handler, clock.clone()));
        let activate = Arc::new(ActivateBranch::new(execute_effects.clone(), clock.clone()));
        let tick = Arc::new(RunTick::new(
            branch_repo.clone(),
            evaluate_conditions.clone(),
            activate.clone(),
            execute_effects.clone(),
            clock.clone(),
        ));
        let manage = Arc::new(ManageBranches::new(
            branch_repo.clone(),
            activate.clone(),
            clock,
        ));

        let storyline = use_cases::StorylineUseCases::new(
            evaluate_conditions,
            execute_effects,
            activate,
            tick,
            manage,
        );

        Self {
            repositories: Repositories {
                branch: branch_repo,
            },
            use_cases: UseCases { storyline },
        }
    }
}

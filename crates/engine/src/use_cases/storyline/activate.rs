//! Activate branch use case.
//!
//! Stamps a branch's activation exactly once and hands it to the effect
//! pipeline. Activation does not look at conditions; callers decide whether
//! the branch is ready.

use std::sync::Arc;

use booker_domain::{ActivationContext, NoChange, StorylineBranch, StorylineBranchUpdate};
use chrono::{DateTime, Utc};

use super::execute_effects::{EffectPipelineReport, ExecuteEffects};
use crate::infrastructure::ports::ClockPort;

#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    Activated {
        at: DateTime<Utc>,
        context: ActivationContext,
        effects: EffectPipelineReport,
    },
    /// Manual activation refused because some conditions are still unmet
    ConditionsUnmet { progress: f32 },
    Unchanged(NoChange),
}

impl ActivationOutcome {
    pub fn is_activated(&self) -> bool {
        matches!(self, Self::Activated { .. })
    }

    pub fn effects(&self) -> Option<&EffectPipelineReport> {
        match self {
            Self::Activated { effects, .. } => Some(effects),
            _ => None,
        }
    }
}

pub struct ActivateBranch {
    effects: Arc<ExecuteEffects>,
    clock: Arc<dyn ClockPort>,
}

impl ActivateBranch {
    pub fn new(effects: Arc<ExecuteEffects>, clock: Arc<dyn ClockPort>) -> Self {
        Self { effects, clock }
    }

    /// Activate the branch and run its effects.
    ///
    /// Inactive or already-activated branches come back as `Unchanged` and no
    /// effect runs. Effect failures are inside the returned report.
    #[tracing::instrument(skip(self, branch), fields(branch_id = %branch.id(), context = %context))]
    pub async fn execute(
        &self,
        branch: &mut StorylineBranch,
        context: ActivationContext,
    ) -> ActivationOutcome {
        let now = self.clock.now();
        let at = match branch.activate(context.clone(), now) {
            StorylineBranchUpdate::Unchanged(reason) => {
                tracing::debug!(reason = %reason, "Activation skipped");
                return ActivationOutcome::Unchanged(reason);
            }
            _ => branch.activated_at().unwrap_or(now),
        };

        tracing::info!(
            branch_id = %branch.id(),
            branch_name = %branch.name(),
            branch_type = %branch.branch_type(),
            activated_at = %at,
            "Storyline branch activated"
        );

        let effects = self.effects.execute(branch).await;
        ActivationOutcome::Activated {
            at,
            context,
            effects,
        }
    }
}

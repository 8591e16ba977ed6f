//! Run tick use case.
//!
//! One full pass over every stored branch:
//!
//! 1. Load all branches (the only step whose failure aborts the tick)
//! 2. Evaluate due conditions and save the branches whose bookkeeping changed
//! 3. Select ready branches and activate them in selection order, running
//!    their effects and saving each branch as soon as it is done
//! 4. Re-run the effect pipeline for activated branches that still have
//!    pending effects (interrupted earlier, or reset by an operator)
//!
//! Every unit commits on its own; a save failure is reported and the tick
//! moves on. Ticks must not overlap: the caller serializes them.

use std::sync::Arc;

use booker_domain::{
    select_for_activation, ActivationContext, BranchId, BranchStatus, StorylineBranch,
};
use chrono::{DateTime, Utc};

use super::activate::{ActivateBranch, ActivationOutcome};
use super::evaluate_conditions::{ConditionCheckReport, EvaluateConditions};
use super::execute_effects::{EffectPipelineReport, ExecuteEffects};
use crate::infrastructure::ports::{BranchRepo, ClockPort, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("Failed to load storyline branches: {0}")]
    Load(#[from] RepoError),
}

/// A branch whose status differs between the start and the end of the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub branch_id: BranchId,
    pub branch_name: String,
    pub from: BranchStatus,
    pub to: BranchStatus,
}

/// Effects run for one branch during the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchEffectsRun {
    pub branch_id: BranchId,
    pub branch_name: String,
    pub activated_at: DateTime<Utc>,
    pub effects: EffectPipelineReport,
}

impl BranchEffectsRun {
    pub(super) fn new(
        branch: &StorylineBranch,
        activated_at: DateTime<Utc>,
        effects: EffectPipelineReport,
    ) -> Self {
        Self {
            branch_id: branch.id(),
            branch_name: branch.name().to_string(),
            activated_at,
            effects,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub branch_id: BranchId,
    pub error: String,
}

/// Everything a caller needs to publish notifications for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub branches_loaded: usize,
    pub conditions: ConditionCheckReport,
    /// Branches activated this tick, in activation order
    pub activations: Vec<BranchEffectsRun>,
    /// Previously activated branches whose pending effects ran this tick
    pub resumed: Vec<BranchEffectsRun>,
    /// Ready branches held back by single-instance contention
    pub deferred: Vec<BranchId>,
    pub transitions: Vec<StatusTransition>,
    pub save_failures: Vec<SaveFailure>,
}

impl TickReport {
    pub fn effects_executed(&self) -> usize {
        self.activations
            .iter()
            .chain(&self.resumed)
            .map(|run| run.effects.outcomes.len())
            .sum()
    }

    /// Human-readable outcome log: one line per activation and per effect.
    pub fn outcome_log(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for warning in &self.conditions.warnings {
            lines.push(format!("condition check failed: {}", warning));
        }
        for run in &self.activations {
            lines.push(format!("activated '{}'", run.branch_name));
            lines.extend(run.effects.log().into_iter().map(|l| format!("  {}", l)));
        }
        for run in &self.resumed {
            lines.push(format!("resumed effects for '{}'", run.branch_name));
            lines.extend(run.effects.log().into_iter().map(|l| format!("  {}", l)));
        }
        for failure in &self.save_failures {
            lines.push(format!("save failed for {}: {}", failure.branch_id, failure.error));
        }
        lines
    }
}

pub struct RunTick {
    repo: Arc<dyn BranchRepo>,
    evaluate: Arc<EvaluateConditions>,
    activate: Arc<ActivateBranch>,
    effects: Arc<ExecuteEffects>,
    clock: Arc<dyn ClockPort>,
}

impl RunTick {
    pub fn new(
        repo: Arc<dyn BranchRepo>,
        evaluate: Arc<EvaluateConditions>,
        activate: Arc<ActivateBranch>,
        effects: Arc<ExecuteEffects>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            repo,
            evaluate,
            activate,
            effects,
            clock,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self) -> Result<TickReport, TickError> {
        let started_at = self.clock.now();
        let mut branches = self.repo.list_all().await?;
        let before: Vec<(BranchId, BranchStatus)> =
            branches.iter().map(|b| (b.id(), b.status())).collect();
        let mut save_failures = Vec::new();

        // Conditions
        let conditions = self.evaluate.execute(&mut branches, started_at).await;
        for branch in branches
            .iter()
            .filter(|b| conditions.touched.contains(&b.id()))
        {
            self.persist(branch, &mut save_failures).await;
        }

        // Selection + activation
        let selection = select_for_activation(&branches);
        for id in &selection.deferred {
            tracing::debug!(branch_id = %id, "Ready branch deferred by single-instance contention");
        }

        let mut activations = Vec::new();
        for id in &selection.selected {
            let Some(branch) = branches.iter_mut().find(|b| b.id() == *id) else {
                continue;
            };
            let outcome = self
                .activate
                .execute(branch, ActivationContext::Scheduled)
                .await;
            if let ActivationOutcome::Activated { at, effects, .. } = outcome {
                activations.push(BranchEffectsRun::new(branch, at, effects));
                self.persist(branch, &mut save_failures).await;
            }
        }

        // Resume interrupted or reset effects
        let mut resumed = Vec::new();
        for branch in branches.iter_mut().filter(|b| {
            b.status() == BranchStatus::Activated
                && b.has_pending_effects()
                && !selection.selected.contains(&b.id())
        }) {
            let effects = self.effects.execute(branch).await;
            if effects.is_empty() {
                continue;
            }
            let activated_at = branch.activated_at().unwrap_or(started_at);
            resumed.push(BranchEffectsRun::new(branch, activated_at, effects));
            self.persist(branch, &mut save_failures).await;
        }

        let transitions = status_transitions(&before, &branches);
        for t in &transitions {
            tracing::info!(
                branch_id = %t.branch_id,
                from = %t.from,
                to = %t.to,
                "Storyline branch status changed"
            );
        }

        let report = TickReport {
            started_at,
            branches_loaded: branches.len(),
            conditions,
            activations,
            resumed,
            deferred: selection.deferred,
            transitions,
            save_failures,
        };

        tracing::info!(
            branches = report.branches_loaded,
            conditions_checked = report.conditions.checked,
            conditions_met = report.conditions.newly_met.len(),
            evaluation_warnings = report.conditions.warnings.len(),
            activated = report.activations.len(),
            deferred = report.deferred.len(),
            effects_executed = report.effects_executed(),
            save_failures = report.save_failures.len(),
            "Tick complete"
        );

        Ok(report)
    }

    async fn persist(&self, branch: &StorylineBranch, failures: &mut Vec<SaveFailure>) {
        if let Err(e) = self.repo.save(branch).await {
            tracing::warn!(error = %e, branch_id = %branch.id(), "Failed to save storyline branch");
            failures.push(SaveFailure {
                branch_id: branch.id(),
                error: e.to_string(),
            });
        }
    }
}

fn status_transitions(
    before: &[(BranchId, BranchStatus)],
    after: &[StorylineBranch],
) -> Vec<StatusTransition> {
    before
        .iter()
        .filter_map(|(id, from)| {
            let branch = after.iter().find(|b| b.id() == *id)?;
            let to = branch.status();
            (to != *from).then(|| StatusTransition {
                branch_id: *id,
                branch_name: branch.name().to_string(),
                from: *from,
                to,
            })
        })
        .collect()
}

//! Branch management use cases.
//!
//! Operator-facing CRUD and lifecycle calls around storyline branches: create
//! a branch, attach conditions and effects, activate or complete by hand,
//! cancel, expire stale branches, reset an effect, react to a segment result,
//! and the read-side queries.
//! Every mutation loads the aggregate, applies one domain method and saves it.

use std::sync::Arc;

use booker_domain::{
    select_for_activation, ActivationContext, BranchCondition, BranchEffect, BranchId,
    BranchName, BranchStatus, BranchType, ConditionType, Description, DomainError, EffectId,
    EffectType, SegmentId, StorylineBranch, StorylineBranchUpdate,
};
use chrono::{DateTime, Duration, Utc};

use super::activate::{ActivateBranch, ActivationOutcome};
use super::tick::BranchEffectsRun;
use crate::infrastructure::ports::{BranchRepo, ClockPort, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    #[error("Storyline branch not found: {0}")]
    BranchNotFound(BranchId),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Counts across all stored branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchStatistics {
    pub total_active: usize,
    pub ready_to_activate: usize,
    pub waiting_for_conditions: usize,
    pub activated: usize,
    pub completed: usize,
}

/// Branches activated by one segment result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentOutcomeReport {
    pub activations: Vec<BranchEffectsRun>,
    /// Ready branches held back by single-instance contention
    pub deferred: Vec<BranchId>,
}

/// Branch types a booked segment's result can trigger.
fn triggered_by_segment(branch_type: BranchType, is_title_segment: bool) -> bool {
    match branch_type {
        BranchType::MatchOutcome | BranchType::RivalryEscalation => true,
        BranchType::TitleChange => is_title_segment,
        _ => false,
    }
}

pub struct ManageBranches {
    repo: Arc<dyn BranchRepo>,
    activate: Arc<ActivateBranch>,
    clock: Arc<dyn ClockPort>,
}

impl ManageBranches {
    pub fn new(
        repo: Arc<dyn BranchRepo>,
        activate: Arc<ActivateBranch>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            repo,
            activate,
            clock,
        }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create and store a new active branch. `priority <= 0` uses the type default.
    #[tracing::instrument(skip(self, description))]
    pub async fn create_branch(
        &self,
        name: &str,
        description: &str,
        branch_type: BranchType,
        priority: i32,
    ) -> Result<StorylineBranch, ManagementError> {
        let branch = StorylineBranch::new(BranchName::new(name)?, branch_type, self.clock.now())
            .with_description(Description::new(description)?)
            .with_priority(priority);
        self.repo.save(&branch).await?;
        tracing::info!(
            branch_id = %branch.id(),
            branch_type = %branch_type,
            priority = branch.priority(),
            "Created storyline branch"
        );
        Ok(branch)
    }

    #[tracing::instrument(skip(self, value, description))]
    pub async fn add_condition(
        &self,
        branch_id: BranchId,
        condition_type: &str,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<BranchCondition, ManagementError> {
        let mut branch = self.load(branch_id).await?;
        let now = self.clock.now();
        let mut condition = BranchCondition::new(ConditionType::new(condition_type)?, key, value, now);
        if let Some(text) = description {
            condition = condition.with_description(Description::new(text)?);
        }
        branch.add_condition(condition.clone(), now)?;
        self.repo.save(&branch).await?;
        Ok(condition)
    }

    /// Attach an effect. `order <= 0` is stored as 1.
    #[tracing::instrument(skip(self, value, description))]
    pub async fn add_effect(
        &self,
        branch_id: BranchId,
        effect_type: &str,
        key: &str,
        value: &str,
        description: Option<&str>,
        order: i32,
    ) -> Result<BranchEffect, ManagementError> {
        let mut branch = self.load(branch_id).await?;
        let now = self.clock.now();
        let order = u32::try_from(order).unwrap_or(1).max(1);
        let mut effect = BranchEffect::new(EffectType::new(effect_type)?, key, value, order, now);
        if let Some(text) = description {
            effect = effect.with_description(Description::new(text)?);
        }
        branch.add_effect(effect.clone(), now)?;
        self.repo.save(&branch).await?;
        Ok(effect)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Manual activation. Refused while any condition is unmet.
    #[tracing::instrument(skip(self))]
    pub async fn activate_branch(
        &self,
        branch_id: BranchId,
        context: ActivationContext,
    ) -> Result<ActivationOutcome, ManagementError> {
        let mut branch = self.load(branch_id).await?;

        if branch.status() == BranchStatus::WaitingForConditions {
            let progress = branch.condition_progress();
            tracing::info!(branch_id = %branch_id, progress, "Activation refused: conditions unmet");
            return Ok(ActivationOutcome::ConditionsUnmet { progress });
        }

        let outcome = self.activate.execute(&mut branch, context).await;
        if outcome.is_activated() {
            self.repo.save(&branch).await?;
        }
        Ok(outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn complete_branch(
        &self,
        branch_id: BranchId,
        reason: &str,
    ) -> Result<StorylineBranchUpdate, ManagementError> {
        let mut branch = self.load(branch_id).await?;
        let update = branch.complete(reason, self.clock.now());
        self.save_if_applied(&branch, &update).await?;
        if update.is_applied() {
            tracing::info!(branch_id = %branch_id, reason = %reason, "Storyline branch completed");
        }
        Ok(update)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_branch(
        &self,
        branch_id: BranchId,
        reason: &str,
    ) -> Result<StorylineBranchUpdate, ManagementError> {
        let mut branch = self.load(branch_id).await?;
        let update = branch.cancel(reason, self.clock.now());
        self.save_if_applied(&branch, &update).await?;
        Ok(update)
    }

    pub async fn set_priority(
        &self,
        branch_id: BranchId,
        priority: i32,
    ) -> Result<StorylineBranchUpdate, ManagementError> {
        let mut branch = self.load(branch_id).await?;
        let update = branch.set_priority(priority, self.clock.now());
        self.repo.save(&branch).await?;
        Ok(update)
    }

    pub async fn set_active(
        &self,
        branch_id: BranchId,
        active: bool,
    ) -> Result<StorylineBranchUpdate, ManagementError> {
        let mut branch = self.load(branch_id).await?;
        let update = branch.set_active(active, self.clock.now());
        self.repo.save(&branch).await?;
        Ok(update)
    }

    /// Operator correction: put an executed effect back to pending. The next
    /// tick runs it again if the branch is activated.
    #[tracing::instrument(skip(self))]
    pub async fn reset_effect(
        &self,
        branch_id: BranchId,
        effect_id: EffectId,
    ) -> Result<StorylineBranchUpdate, ManagementError> {
        let mut branch = self.load(branch_id).await?;
        let update = branch.reset_effect(effect_id, self.clock.now())?;
        self.repo.save(&branch).await?;
        tracing::info!(branch_id = %branch_id, effect_id = %effect_id, "Effect reset to pending");
        Ok(update)
    }

    pub async fn delete_branch(&self, branch_id: BranchId) -> Result<(), ManagementError> {
        self.repo.delete(branch_id).await.map_err(|e| {
            if e.is_not_found() {
                ManagementError::BranchNotFound(branch_id)
            } else {
                e.into()
            }
        })
    }

    // =========================================================================
    // Expiry (explicit operator call, never part of a tick)
    // =========================================================================

    /// Active, never-activated, open branches created more than `days` ago.
    pub async fn expired_branches(&self, days: u32) -> Result<Vec<StorylineBranch>, ManagementError> {
        let cutoff = self.clock.now() - Duration::days(i64::from(days));
        Ok(self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| {
                b.is_active()
                    && b.closure().is_none()
                    && b.activated_at().is_none()
                    && b.created_at() < cutoff
            })
            .collect())
    }

    /// Close every branch from [`Self::expired_branches`] as expired.
    #[tracing::instrument(skip(self))]
    pub async fn expire_stale_branches(&self, days: u32) -> Result<Vec<BranchId>, ManagementError> {
        let now = self.clock.now();
        let mut expired = Vec::new();
        for mut branch in self.expired_branches(days).await? {
            let update = branch.expire(format!("not activated within {} days", days), now);
            if update.is_applied() {
                self.repo.save(&branch).await?;
                expired.push(branch.id());
            }
        }
        tracing::info!(count = expired.len(), days, "Expired stale storyline branches");
        Ok(expired)
    }

    // =========================================================================
    // Segment triggers
    // =========================================================================

    /// React to a booked segment's result.
    ///
    /// Ready match-outcome and rivalry branches activate for any segment;
    /// title-change branches only when a title was on the line. Winners go
    /// through the same selection as a tick, so single-instance types still
    /// allow one holder at a time.
    #[tracing::instrument(skip(self, summary))]
    pub async fn process_segment_outcome(
        &self,
        segment_id: SegmentId,
        summary: Option<&str>,
        is_title_segment: bool,
    ) -> Result<SegmentOutcomeReport, ManagementError> {
        // Activated branches stay in view as single-instance holders
        let mut branches: Vec<StorylineBranch> = self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| {
                triggered_by_segment(b.branch_type(), is_title_segment)
                    || b.status() == BranchStatus::Activated
            })
            .collect();

        let selection = select_for_activation(&branches);
        let context = ActivationContext::Segment {
            segment_id,
            summary: summary.map(str::to_string),
        };

        let mut report = SegmentOutcomeReport {
            deferred: selection.deferred,
            ..SegmentOutcomeReport::default()
        };
        for id in &selection.selected {
            let Some(branch) = branches.iter_mut().find(|b| b.id() == *id) else {
                continue;
            };
            if let ActivationOutcome::Activated { at, effects, .. } =
                self.activate.execute(branch, context.clone()).await
            {
                self.repo.save(branch).await?;
                report.activations.push(BranchEffectsRun::new(branch, at, effects));
            }
        }

        tracing::info!(
            segment_id = %segment_id,
            activated = report.activations.len(),
            deferred = report.deferred.len(),
            "Segment outcome processed"
        );
        Ok(report)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_branch(&self, branch_id: BranchId) -> Result<Option<StorylineBranch>, ManagementError> {
        Ok(self.repo.get(branch_id).await?)
    }

    pub async fn branches_by_type(
        &self,
        branch_type: BranchType,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        Ok(self.repo.list_by_type(branch_type).await?)
    }

    pub async fn ready_to_activate(&self) -> Result<Vec<StorylineBranch>, ManagementError> {
        self.active_with_status(BranchStatus::ReadyToActivate).await
    }

    pub async fn waiting_for_conditions(&self) -> Result<Vec<StorylineBranch>, ManagementError> {
        self.active_with_status(BranchStatus::WaitingForConditions).await
    }

    pub async fn activated_with_pending_effects(
        &self,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        Ok(self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| b.status() == BranchStatus::Activated && b.has_pending_effects())
            .collect())
    }

    /// Active, non-terminal branches by priority (highest first, oldest on ties).
    pub async fn highest_priority(&self, limit: usize) -> Result<Vec<StorylineBranch>, ManagementError> {
        let mut branches: Vec<StorylineBranch> = self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| b.is_active() && !b.status().is_terminal())
            .collect();
        branches.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        branches.truncate(limit);
        Ok(branches)
    }

    /// Branches with at least one condition of the given type.
    pub async fn branches_with_condition_type(
        &self,
        condition_type: &ConditionType,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        Ok(self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| b.conditions().iter().any(|c| c.condition_type() == condition_type))
            .collect())
    }

    /// Branches with at least one effect of the given type.
    pub async fn branches_with_effect_type(
        &self,
        effect_type: &EffectType,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        Ok(self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| b.effects().iter().any(|e| e.effect_type() == effect_type))
            .collect())
    }

    /// Branches activated in `[from, to]`, oldest activation first.
    pub async fn activated_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        self.stamped_between(from, to, StorylineBranch::activated_at).await
    }

    /// Branches completed in `[from, to]`, oldest completion first.
    pub async fn completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        self.stamped_between(from, to, StorylineBranch::completed_at).await
    }

    /// Branches created within the last `days`, newest first.
    pub async fn recent(&self, days: u32) -> Result<Vec<StorylineBranch>, ManagementError> {
        let since = self.clock.now() - Duration::days(i64::from(days));
        let mut branches: Vec<StorylineBranch> = self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| b.created_at() >= since)
            .collect();
        branches.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(branches)
    }

    pub async fn statistics(&self) -> Result<BranchStatistics, ManagementError> {
        let branches = self.repo.list_all().await?;
        let mut stats = BranchStatistics::default();
        for branch in &branches {
            if branch.is_active() {
                stats.total_active += 1;
            }
            match branch.status() {
                BranchStatus::ReadyToActivate if branch.is_active() => stats.ready_to_activate += 1,
                BranchStatus::WaitingForConditions if branch.is_active() => {
                    stats.waiting_for_conditions += 1
                }
                BranchStatus::Activated => stats.activated += 1,
                BranchStatus::Completed => stats.completed += 1,
                _ => {}
            }
        }
        Ok(stats)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load(&self, branch_id: BranchId) -> Result<StorylineBranch, ManagementError> {
        self.repo
            .get(branch_id)
            .await?
            .ok_or(ManagementError::BranchNotFound(branch_id))
    }

    async fn active_with_status(
        &self,
        status: BranchStatus,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        Ok(self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| b.is_active() && b.status() == status)
            .collect())
    }

    async fn stamped_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        stamp: fn(&StorylineBranch) -> Option<DateTime<Utc>>,
    ) -> Result<Vec<StorylineBranch>, ManagementError> {
        let mut branches: Vec<StorylineBranch> = self
            .repo
            .list_all()
            .await?
            .into_iter()
            .filter(|b| stamp(b).is_some_and(|at| from <= at && at <= to))
            .collect();
        branches.sort_by_key(|b| stamp(b));
        Ok(branches)
    }

    async fn save_if_applied(
        &self,
        branch: &StorylineBranch,
        update: &StorylineBranchUpdate,
    ) -> Result<(), ManagementError> {
        match update {
            StorylineBranchUpdate::Unchanged(reason) => {
                tracing::debug!(branch_id = %branch.id(), reason = %reason, "No change");
                Ok(())
            }
            _ => Ok(self.repo.save(branch).await?),
        }
    }
}

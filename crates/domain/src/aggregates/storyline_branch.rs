//! StorylineBranch aggregate - a conditionally triggered sub-plot
//!
//! A branch waits on an ordered list of conditions, activates once all of
//! them hold, and then fires its effects. Conditions and effects are owned by
//! the branch and only change through it.
//!
//! # Rustic DDD Design
//!
//! This aggregate follows Rustic DDD principles:
//! - **Private fields**: All fields are encapsulated
//! - **Valid by construction**: `new()` takes pre-validated types
//! - **Domain behavior**: `activate()`, `complete()`, `cancel()`, `expire()`
//!
//! # Invariants
//!
//! - Activation time is set at most once and never precedes creation
//! - Completion time is set at most once and only after activation
//! - An inactive branch that never activated is dormant and is skipped by
//!   scheduling and selection
//! - Cancelled/expired closures are set only by explicit operator calls

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{BranchCondition, BranchEffect, ConditionChange};
use crate::error::DomainError;
use crate::events::{NoChange, StorylineBranchUpdate};
use crate::ids::{BranchId, ConditionId, EffectId};
use crate::status::{derive_status, BranchStatus};
use crate::value_objects::{ActivationContext, BranchName, BranchType, Description};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum BranchActivation {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ActivationRecord {
    at: DateTime<Utc>,
    context: ActivationContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRecord {
    at: DateTime<Utc>,
    reason: String,
}

/// Operator-forced terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosureKind {
    Cancelled,
    Expired,
}

impl ClosureKind {
    pub fn status(self) -> BranchStatus {
        match self {
            Self::Cancelled => BranchStatus::Cancelled,
            Self::Expired => BranchStatus::Expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchClosure {
    pub kind: ClosureKind,
    pub at: DateTime<Utc>,
    pub reason: String,
}

/// A storyline branch with its conditions and effects.
///
/// # Example
///
/// ```
/// use chrono::TimeZone;
/// use booker_domain::{BranchName, BranchStatus, BranchType, StorylineBranch};
///
/// let now = chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// let branch = StorylineBranch::new(
///     BranchName::new("Title Picture Shake-up").unwrap(),
///     BranchType::TitleChange,
///     now,
/// );
///
/// assert_eq!(branch.priority(), 10);
/// assert!(branch.is_active());
/// assert_eq!(branch.status(), BranchStatus::ReadyToActivate);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorylineBranch {
    // Identity
    id: BranchId,

    // Basic Info
    name: BranchName,
    description: Description,
    branch_type: BranchType,

    // Scheduling
    activation: BranchActivation,
    /// Higher = selected first
    priority: i32,

    // Children (ordered by insertion)
    conditions: Vec<BranchCondition>,
    effects: Vec<BranchEffect>,

    // Lifecycle
    activated: Option<ActivationRecord>,
    completed: Option<CompletionRecord>,
    closure: Option<BranchClosure>,

    // Metadata
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorylineBranch {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Create an active branch with the type's default priority.
    pub fn new(name: BranchName, branch_type: BranchType, now: DateTime<Utc>) -> Self {
        Self {
            id: BranchId::new(),
            name,
            description: Description::empty(),
            branch_type,
            activation: BranchActivation::Active,
            priority: branch_type.default_priority(),
            conditions: Vec::new(),
            effects: Vec::new(),
            activated: None,
            completed: None,
            closure: None,
            created_at: now,
            updated_at: now,
        }
    }

    // =========================================================================
    // Identity & Basic Info Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> BranchId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &BranchName {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    #[inline]
    pub fn branch_type(&self) -> BranchType {
        self.branch_type
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.activation, BranchActivation::Active)
    }

    /// Inactive and never activated: excluded from scheduling and selection.
    #[inline]
    pub fn is_dormant(&self) -> bool {
        !self.is_active() && self.activated.is_none()
    }

    // =========================================================================
    // Children Accessors
    // =========================================================================

    #[inline]
    pub fn conditions(&self) -> &[BranchCondition] {
        &self.conditions
    }

    #[inline]
    pub fn effects(&self) -> &[BranchEffect] {
        &self.effects
    }

    pub fn condition(&self, id: ConditionId) -> Option<&BranchCondition> {
        self.conditions.iter().find(|c| c.id() == id)
    }

    pub fn effect(&self, id: EffectId) -> Option<&BranchEffect> {
        self.effects.iter().find(|e| e.id() == id)
    }

    pub fn are_conditions_met(&self) -> bool {
        self.conditions.iter().all(BranchCondition::is_met)
    }

    /// Fraction of conditions met, 1.0 when there are none.
    pub fn condition_progress(&self) -> f32 {
        if self.conditions.is_empty() {
            return 1.0;
        }
        let met = self.conditions.iter().filter(|c| c.is_met()).count();
        met as f32 / self.conditions.len() as f32
    }

    pub fn has_pending_effects(&self) -> bool {
        self.effects.iter().any(|e| !e.is_executed())
    }

    /// Pending effects in execution order.
    ///
    /// Ascending execution order, then descending effect-type execution
    /// priority, then insertion order.
    pub fn pending_effects_in_order(&self) -> Vec<&BranchEffect> {
        let mut pending: Vec<&BranchEffect> =
            self.effects.iter().filter(|e| !e.is_executed()).collect();
        // stable: equal keys keep insertion order
        pending.sort_by(|a, b| {
            a.execution_order()
                .cmp(&b.execution_order())
                .then_with(|| {
                    b.effect_type()
                        .execution_priority()
                        .cmp(&a.effect_type().execution_priority())
                })
        });
        pending
    }

    // =========================================================================
    // Lifecycle Accessors
    // =========================================================================

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated.as_ref().map(|a| a.at)
    }

    pub fn activation_context(&self) -> Option<&ActivationContext> {
        self.activated.as_ref().map(|a| &a.context)
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed.as_ref().map(|c| c.at)
    }

    pub fn completion_reason(&self) -> Option<&str> {
        self.completed.as_ref().map(|c| c.reason.as_str())
    }

    pub fn closure(&self) -> Option<&BranchClosure> {
        self.closure.as_ref()
    }

    #[inline]
    pub fn is_activated(&self) -> bool {
        self.activated.is_some()
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Status computed from timestamps and conditions only.
    ///
    /// Never returns `Cancelled` or `Expired`.
    pub fn derived_status(&self) -> BranchStatus {
        derive_status(self.activated_at(), self.completed_at(), &self.conditions)
    }

    /// Status as callers should see it: a forced closure if present, otherwise
    /// the derived status.
    pub fn status(&self) -> BranchStatus {
        match &self.closure {
            Some(closure) => closure.kind.status(),
            None => self.derived_status(),
        }
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // =========================================================================
    // Builder Methods (for construction and loading)
    // =========================================================================

    /// Set the branch's ID (used when loading from storage).
    pub fn with_id(mut self, id: BranchId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = description;
        self
    }

    /// Set the priority. Zero or negative keeps the branch type's default.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = self.normalized_priority(priority);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.activation = if active {
            BranchActivation::Active
        } else {
            BranchActivation::Inactive
        };
        self
    }

    pub fn with_condition(mut self, condition: BranchCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_effect(mut self, effect: BranchEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Restore an activation (used when loading from storage).
    pub fn with_activation(mut self, at: DateTime<Utc>, context: ActivationContext) -> Self {
        self.activated = Some(ActivationRecord { at, context });
        self
    }

    /// Restore a completion (used when loading from storage).
    pub fn with_completion(mut self, at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        self.completed = Some(CompletionRecord {
            at,
            reason: reason.into(),
        });
        self
    }

    /// Restore a forced closure (used when loading from storage).
    pub fn with_closure(mut self, closure: BranchClosure) -> Self {
        self.closure = Some(closure);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    // =========================================================================
    // Mutation Methods
    // =========================================================================

    /// `priority <= 0` falls back to the branch type's default.
    pub fn set_priority(&mut self, priority: i32, now: DateTime<Utc>) -> StorylineBranchUpdate {
        let previous = self.priority;
        self.priority = self.normalized_priority(priority);
        self.updated_at = now;
        StorylineBranchUpdate::PriorityChanged {
            from: previous,
            to: self.priority,
        }
    }

    fn normalized_priority(&self, priority: i32) -> i32 {
        if priority > 0 {
            priority
        } else {
            self.branch_type.default_priority()
        }
    }

    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) -> StorylineBranchUpdate {
        let previous = self.is_active();
        self.activation = if active {
            BranchActivation::Active
        } else {
            BranchActivation::Inactive
        };
        self.updated_at = now;
        StorylineBranchUpdate::ActivationChanged {
            from: previous,
            to: active,
        }
    }

    /// Attach a condition. Only allowed before activation.
    pub fn add_condition(
        &mut self,
        condition: BranchCondition,
        now: DateTime<Utc>,
    ) -> Result<StorylineBranchUpdate, DomainError> {
        self.ensure_editable("add a condition to")?;
        let condition_id = condition.id();
        self.conditions.push(condition);
        self.updated_at = now;
        Ok(StorylineBranchUpdate::ConditionAdded { condition_id })
    }

    /// Attach an effect. Only allowed before activation.
    pub fn add_effect(
        &mut self,
        effect: BranchEffect,
        now: DateTime<Utc>,
    ) -> Result<StorylineBranchUpdate, DomainError> {
        self.ensure_editable("add an effect to")?;
        let effect_id = effect.id();
        self.effects.push(effect);
        self.updated_at = now;
        Ok(StorylineBranchUpdate::EffectAdded { effect_id })
    }

    fn ensure_editable(&self, action: &str) -> Result<(), DomainError> {
        if self.is_activated() || self.closure.is_some() {
            return Err(DomainError::invalid_state_transition(format!(
                "Cannot {} branch '{}' in status {}",
                action,
                self.name,
                self.status()
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Domain Methods - Condition Bookkeeping
    // =========================================================================

    /// Record an evaluator answer for one of this branch's conditions.
    pub fn record_condition_check(
        &mut self,
        condition_id: ConditionId,
        met: bool,
        now: DateTime<Utc>,
    ) -> Result<ConditionChange, DomainError> {
        let condition = self.condition_mut(condition_id)?;
        let change = condition.record_check(met, now);
        self.updated_at = now;
        Ok(change)
    }

    /// Record an evaluation attempt that failed.
    pub fn record_condition_failure(
        &mut self,
        condition_id: ConditionId,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.condition_mut(condition_id)?.record_failed_check(now);
        self.updated_at = now;
        Ok(())
    }

    fn condition_mut(&mut self, id: ConditionId) -> Result<&mut BranchCondition, DomainError> {
        self.conditions
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| DomainError::not_found("BranchCondition", id.to_string()))
    }

    // =========================================================================
    // Domain Methods - Effect Bookkeeping
    // =========================================================================

    /// Record a successful effect execution. `Ok(false)` if it had already run.
    pub fn record_effect_success(
        &mut self,
        effect_id: EffectId,
        result: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let changed = self.effect_mut(effect_id)?.mark_executed(result, now);
        if changed {
            self.updated_at = now;
        }
        Ok(changed)
    }

    /// Record a failed effect execution. The effect still counts as executed.
    pub fn record_effect_failure(
        &mut self,
        effect_id: EffectId,
        error: impl std::fmt::Display,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let changed = self.effect_mut(effect_id)?.mark_failed(error, now);
        if changed {
            self.updated_at = now;
        }
        Ok(changed)
    }

    /// Operator correction: put an executed effect back to pending.
    pub fn reset_effect(
        &mut self,
        effect_id: EffectId,
        now: DateTime<Utc>,
    ) -> Result<StorylineBranchUpdate, DomainError> {
        self.effect_mut(effect_id)?.reset_execution();
        self.updated_at = now;
        Ok(StorylineBranchUpdate::EffectReset { effect_id })
    }

    fn effect_mut(&mut self, id: EffectId) -> Result<&mut BranchEffect, DomainError> {
        self.effects
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| DomainError::not_found("BranchEffect", id.to_string()))
    }

    // =========================================================================
    // Domain Methods - Lifecycle
    // =========================================================================

    /// Stamp the activation time and record what caused it.
    ///
    /// A no-op for inactive branches and for branches that already activated.
    /// Condition state is not checked here; callers decide readiness.
    pub fn activate(
        &mut self,
        context: ActivationContext,
        now: DateTime<Utc>,
    ) -> StorylineBranchUpdate {
        if let Some(record) = &self.activated {
            return StorylineBranchUpdate::Unchanged(NoChange::AlreadyActivated { at: record.at });
        }
        if let Some(closure) = &self.closure {
            return StorylineBranchUpdate::Unchanged(NoChange::AlreadyClosed {
                status: closure.kind.status(),
            });
        }
        if !self.is_active() {
            return StorylineBranchUpdate::Unchanged(NoChange::Dormant);
        }

        let at = now.max(self.created_at);
        self.activated = Some(ActivationRecord {
            at,
            context: context.clone(),
        });
        self.updated_at = at;
        StorylineBranchUpdate::Activated { at, context }
    }

    /// Stamp the completion time and deactivate the branch.
    pub fn complete(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> StorylineBranchUpdate {
        if let Some(record) = &self.completed {
            return StorylineBranchUpdate::Unchanged(NoChange::AlreadyCompleted { at: record.at });
        }
        let Some(activated_at) = self.activated_at() else {
            return StorylineBranchUpdate::Unchanged(NoChange::NotActivated);
        };

        let at = now.max(activated_at);
        let reason = reason.into();
        self.completed = Some(CompletionRecord {
            at,
            reason: reason.clone(),
        });
        self.activation = BranchActivation::Inactive;
        self.updated_at = at;
        StorylineBranchUpdate::Completed { at, reason }
    }

    /// Operator override: close the branch as cancelled.
    pub fn cancel(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> StorylineBranchUpdate {
        self.close(ClosureKind::Cancelled, reason.into(), now)
    }

    /// Operator override: close a never-activated branch as expired.
    pub fn expire(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> StorylineBranchUpdate {
        if let Some(at) = self.activated_at() {
            return StorylineBranchUpdate::Unchanged(NoChange::AlreadyActivated { at });
        }
        self.close(ClosureKind::Expired, reason.into(), now)
    }

    fn close(&mut self, kind: ClosureKind, reason: String, now: DateTime<Utc>) -> StorylineBranchUpdate {
        if let Some(record) = &self.completed {
            return StorylineBranchUpdate::Unchanged(NoChange::AlreadyCompleted { at: record.at });
        }
        if let Some(closure) = &self.closure {
            return StorylineBranchUpdate::Unchanged(NoChange::AlreadyClosed {
                status: closure.kind.status(),
            });
        }

        self.closure = Some(BranchClosure {
            kind,
            at: now,
            reason: reason.clone(),
        });
        self.activation = BranchActivation::Inactive;
        self.updated_at = now;
        StorylineBranchUpdate::Closed {
            status: kind.status(),
            at: now,
            reason,
        }
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Check a branch restored from outside (storage, seed files) against the
    /// lifecycle rules the mutation methods enforce.
    pub fn validate(&self) -> Result<(), DomainError> {
        let activated_at = self.activated_at();
        if let Some(at) = activated_at {
            if at < self.created_at {
                return Err(DomainError::validation("activated before it was created"));
            }
        }
        if let Some(completed_at) = self.completed_at() {
            match activated_at {
                None => return Err(DomainError::validation("completed but never activated")),
                Some(at) if completed_at < at => {
                    return Err(DomainError::validation("completed before it was activated"))
                }
                Some(_) => {}
            }
            if self.closure.is_some() {
                return Err(DomainError::validation("both completed and closed"));
            }
        }
        if let Some(closure) = &self.closure {
            if closure.kind == ClosureKind::Expired && activated_at.is_some() {
                return Err(DomainError::validation("expired after activation"));
            }
        }

        for condition in &self.conditions {
            let Some(met_at) = condition.met_at() else {
                continue;
            };
            if !matches!(condition.last_checked_at(), Some(checked) if checked >= met_at) {
                return Err(DomainError::validation(format!(
                    "condition {} is met after its last check",
                    condition.id()
                )));
            }
        }
        for effect in &self.effects {
            if effect.execution_order() == 0 {
                return Err(DomainError::validation(format!(
                    "effect {} has execution order 0",
                    effect.id()
                )));
            }
            let Some(result) = effect.execution_result() else {
                continue;
            };
            if result.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "effect {} is executed without an outcome",
                    effect.id()
                )));
            }
            if activated_at.is_none() {
                return Err(DomainError::validation(format!(
                    "effect {} is executed on a branch that never activated",
                    effect.id()
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ConditionType, EffectType};
    use chrono::{Duration, TimeZone};

    fn fixed_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn create_test_branch(branch_type: BranchType) -> StorylineBranch {
        StorylineBranch::new(
            BranchName::new("Test Branch").unwrap(),
            branch_type,
            fixed_time(),
        )
    }

    fn condition(kind: &str) -> BranchCondition {
        BranchCondition::new(ConditionType::new(kind).unwrap(), "k", "v", fixed_time())
    }

    fn effect(kind: &str, order: u32) -> BranchEffect {
        BranchEffect::new(EffectType::new(kind).unwrap(), "k", "v", order, fixed_time())
    }

    mod constructor {
        use super::*;

        #[test]
        fn new_uses_type_defaults() {
            let branch = create_test_branch(BranchType::RivalryEscalation);
            assert_eq!(branch.priority(), 8);
            assert!(branch.is_active());
            assert!(!branch.is_dormant());
            assert!(branch.conditions().is_empty());
            assert!(branch.effects().is_empty());
            assert!(branch.activated_at().is_none());
            assert!(branch.completed_at().is_none());
            assert!(branch.closure().is_none());
        }

        #[test]
        fn non_positive_priority_falls_back_to_default() {
            let branch = create_test_branch(BranchType::TitleChange).with_priority(0);
            assert_eq!(branch.priority(), 10);
            let branch = create_test_branch(BranchType::TitleChange).with_priority(3);
            assert_eq!(branch.priority(), 3);
        }

        #[test]
        fn set_priority_normalizes_non_positive_values() {
            let mut branch = create_test_branch(BranchType::FanReaction).with_priority(9);
            let update = branch.set_priority(-2, fixed_time());
            assert_eq!(branch.priority(), 4);
            assert_eq!(update, StorylineBranchUpdate::PriorityChanged { from: 9, to: 4 });

            branch.set_priority(0, fixed_time());
            assert_eq!(branch.priority(), 4);
            branch.set_priority(7, fixed_time());
            assert_eq!(branch.priority(), 7);
        }

        #[test]
        fn inactive_unactivated_branch_is_dormant() {
            let branch = create_test_branch(BranchType::TimeBased).with_active(false);
            assert!(branch.is_dormant());
        }
    }

    mod status {
        use super::*;

        #[test]
        fn empty_condition_list_is_ready() {
            let branch = create_test_branch(BranchType::MatchOutcome);
            assert_eq!(branch.status(), BranchStatus::ReadyToActivate);
            assert_eq!(branch.condition_progress(), 1.0);
        }

        #[test]
        fn unmet_condition_waits_then_flips_to_ready() {
            let mut branch = create_test_branch(BranchType::MatchOutcome)
                .with_condition(condition("WRESTLER_WINS"));
            assert_eq!(branch.status(), BranchStatus::WaitingForConditions);
            assert_eq!(branch.condition_progress(), 0.0);

            let id = branch.conditions()[0].id();
            let change = branch.record_condition_check(id, true, fixed_time()).unwrap();
            assert_eq!(change, ConditionChange::BecameMet);
            assert_eq!(branch.status(), BranchStatus::ReadyToActivate);
        }

        #[test]
        fn closure_overrides_derived_status() {
            let mut branch = create_test_branch(BranchType::DramaResponse);
            branch.cancel("storyline dropped", fixed_time());
            assert_eq!(branch.derived_status(), BranchStatus::ReadyToActivate);
            assert_eq!(branch.status(), BranchStatus::Cancelled);
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn activate_stamps_time_and_context() {
            let mut branch = create_test_branch(BranchType::MatchOutcome);
            let at = fixed_time() + Duration::hours(1);
            let update = branch.activate(ActivationContext::Manual, at);

            assert!(matches!(update, StorylineBranchUpdate::Activated { .. }));
            assert_eq!(branch.activated_at(), Some(at));
            assert_eq!(branch.activation_context(), Some(&ActivationContext::Manual));
            assert_eq!(branch.status(), BranchStatus::Activated);
        }

        #[test]
        fn activate_twice_keeps_first_time() {
            let mut branch = create_test_branch(BranchType::MatchOutcome);
            let first = fixed_time() + Duration::hours(1);
            branch.activate(ActivationContext::Manual, first);
            let update = branch.activate(ActivationContext::Manual, first + Duration::hours(1));

            assert_eq!(
                update,
                StorylineBranchUpdate::Unchanged(NoChange::AlreadyActivated { at: first })
            );
            assert_eq!(branch.activated_at(), Some(first));
        }

        #[test]
        fn activation_never_precedes_creation() {
            let mut branch = create_test_branch(BranchType::MatchOutcome);
            branch.activate(ActivationContext::Manual, fixed_time() - Duration::hours(1));
            assert_eq!(branch.activated_at(), Some(fixed_time()));
        }

        #[test]
        fn inactive_branch_does_not_activate() {
            let mut branch = create_test_branch(BranchType::MatchOutcome).with_active(false);
            let update = branch.activate(ActivationContext::Manual, fixed_time());
            assert_eq!(update, StorylineBranchUpdate::Unchanged(NoChange::Dormant));
            assert!(branch.activated_at().is_none());
        }

        #[test]
        fn complete_requires_activation() {
            let mut branch = create_test_branch(BranchType::MatchOutcome);
            let update = branch.complete("done", fixed_time());
            assert_eq!(update, StorylineBranchUpdate::Unchanged(NoChange::NotActivated));
            assert!(branch.completed_at().is_none());
            assert!(branch.is_active());
        }

        #[test]
        fn complete_deactivates_and_is_idempotent() {
            let mut branch = create_test_branch(BranchType::MatchOutcome);
            let t1 = fixed_time() + Duration::hours(1);
            let t2 = t1 + Duration::hours(1);
            branch.activate(ActivationContext::Manual, t1);

            let update = branch.complete("feud settled", t2);
            assert!(update.is_applied());
            assert!(!branch.is_active());
            assert_eq!(branch.completed_at(), Some(t2));
            assert_eq!(branch.completion_reason(), Some("feud settled"));
            assert_eq!(branch.status(), BranchStatus::Completed);

            let again = branch.complete("again", t2 + Duration::hours(1));
            assert_eq!(
                again,
                StorylineBranchUpdate::Unchanged(NoChange::AlreadyCompleted { at: t2 })
            );
        }

        #[test]
        fn expire_refuses_activated_branch() {
            let mut branch = create_test_branch(BranchType::TimeBased);
            branch.activate(ActivationContext::Manual, fixed_time());
            let update = branch.expire("stale", fixed_time());
            assert!(!update.is_applied());
            assert_eq!(branch.status(), BranchStatus::Activated);
        }

        #[test]
        fn expired_branch_cannot_activate() {
            let mut branch = create_test_branch(BranchType::TimeBased);
            branch.expire("stale", fixed_time());
            assert_eq!(branch.status(), BranchStatus::Expired);
            let update = branch.activate(ActivationContext::Manual, fixed_time());
            assert_eq!(
                update,
                StorylineBranchUpdate::Unchanged(NoChange::AlreadyClosed {
                    status: BranchStatus::Expired
                })
            );
        }
    }

    mod children {
        use super::*;

        #[test]
        fn cannot_add_children_after_activation() {
            let mut branch = create_test_branch(BranchType::MatchOutcome);
            branch.activate(ActivationContext::Manual, fixed_time());
            assert!(branch
                .add_condition(condition("WRESTLER_WINS"), fixed_time())
                .is_err());
            assert!(branch.add_effect(effect("ADD_HEAT", 1), fixed_time()).is_err());
        }

        #[test]
        fn unknown_condition_is_not_found() {
            let mut branch = create_test_branch(BranchType::MatchOutcome);
            let err = branch
                .record_condition_check(ConditionId::new(), true, fixed_time())
                .unwrap_err();
            assert!(matches!(err, DomainError::NotFound { .. }));
        }

        #[test]
        fn pending_effects_sort_by_order_then_priority_then_insertion() {
            let branch = create_test_branch(BranchType::MatchOutcome)
                .with_effect(effect("FINE", 3))
                .with_effect(effect("AWARD_FANS", 1))
                .with_effect(effect("SUSPENSION", 2))
                .with_effect(effect("CREATE_RIVALRY", 2))
                .with_effect(effect("HEAT_PENALTY", 2));

            let order: Vec<&str> = branch
                .pending_effects_in_order()
                .iter()
                .map(|e| e.effect_type().as_str())
                .collect();
            assert_eq!(
                order,
                vec!["AWARD_FANS", "CREATE_RIVALRY", "SUSPENSION", "HEAT_PENALTY", "FINE"]
            );
        }

        #[test]
        fn executed_effects_drop_out_of_pending() {
            let mut branch = create_test_branch(BranchType::MatchOutcome)
                .with_effect(effect("ADD_HEAT", 1))
                .with_effect(effect("AWARD_FANS", 2));
            let first = branch.effects()[0].id();
            assert!(branch.record_effect_success(first, "ok", fixed_time()).unwrap());
            assert!(!branch.record_effect_success(first, "ok", fixed_time()).unwrap());

            let pending = branch.pending_effects_in_order();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].effect_type().as_str(), "AWARD_FANS");
            assert!(branch.has_pending_effects());
        }
    }

    mod integrity {
        use super::*;

        #[test]
        fn lifecycle_built_branches_are_valid() {
            let mut branch = create_test_branch(BranchType::MatchOutcome)
                .with_condition(condition("WRESTLER_WINS"))
                .with_effect(effect("ADD_HEAT", 1));
            assert_eq!(branch.validate(), Ok(()));

            let condition_id = branch.conditions()[0].id();
            branch.record_condition_check(condition_id, true, fixed_time()).unwrap();
            branch.activate(ActivationContext::Manual, fixed_time());
            let effect_id = branch.effects()[0].id();
            branch
                .record_effect_failure(effect_id, "handler down", fixed_time())
                .unwrap();
            branch.complete("done", fixed_time());
            assert_eq!(branch.validate(), Ok(()));
        }

        #[test]
        fn completion_requires_activation() {
            let branch =
                create_test_branch(BranchType::MatchOutcome).with_completion(fixed_time(), "done");
            assert!(matches!(branch.validate(), Err(DomainError::Validation(m)) if m.contains("never activated")));

            let branch = create_test_branch(BranchType::MatchOutcome)
                .with_activation(fixed_time() + Duration::hours(2), ActivationContext::Manual)
                .with_completion(fixed_time() + Duration::hours(1), "done");
            assert!(branch.validate().is_err());
        }

        #[test]
        fn activation_cannot_precede_creation() {
            let branch = create_test_branch(BranchType::MatchOutcome)
                .with_activation(fixed_time() - Duration::minutes(1), ActivationContext::Manual);
            assert!(matches!(branch.validate(), Err(DomainError::Validation(m)) if m.contains("before it was created")));
        }

        #[test]
        fn completed_and_closed_conflict() {
            let branch = create_test_branch(BranchType::MatchOutcome)
                .with_activation(fixed_time(), ActivationContext::Manual)
                .with_completion(fixed_time(), "done")
                .with_closure(BranchClosure {
                    kind: ClosureKind::Cancelled,
                    at: fixed_time(),
                    reason: "scrapped".into(),
                });
            assert!(branch.validate().is_err());
        }

        #[test]
        fn expired_branch_cannot_be_activated() {
            let branch = create_test_branch(BranchType::TimeBased)
                .with_activation(fixed_time(), ActivationContext::Manual)
                .with_closure(BranchClosure {
                    kind: ClosureKind::Expired,
                    at: fixed_time(),
                    reason: "stale".into(),
                });
            assert!(branch.validate().is_err());
        }

        #[test]
        fn met_condition_needs_a_check_time() {
            let branch = create_test_branch(BranchType::MatchOutcome).with_condition(
                condition("WRESTLER_WINS").with_check_state(Some(fixed_time()), None),
            );
            assert!(branch.validate().is_err());

            let branch = create_test_branch(BranchType::MatchOutcome).with_condition(
                condition("WRESTLER_WINS")
                    .with_check_state(Some(fixed_time() + Duration::hours(1)), Some(fixed_time())),
            );
            assert!(branch.validate().is_err());
        }

        #[test]
        fn zero_execution_order_is_rejected() {
            let mut raw = serde_json::to_value(effect("ADD_HEAT", 1)).unwrap();
            raw["execution_order"] = serde_json::json!(0);
            let zero: BranchEffect = serde_json::from_value(raw).unwrap();

            let branch = create_test_branch(BranchType::MatchOutcome).with_effect(zero);
            assert!(matches!(branch.validate(), Err(DomainError::Validation(m)) if m.contains("execution order 0")));
        }

        #[test]
        fn executed_effect_needs_outcome_and_activation() {
            let blank = create_test_branch(BranchType::MatchOutcome)
                .with_activation(fixed_time(), ActivationContext::Manual)
                .with_effect(effect("ADD_HEAT", 1).with_executed(fixed_time(), "  "));
            assert!(matches!(blank.validate(), Err(DomainError::Validation(m)) if m.contains("without an outcome")));

            let early = create_test_branch(BranchType::MatchOutcome)
                .with_effect(effect("ADD_HEAT", 1).with_executed(fixed_time(), "ok"));
            assert!(matches!(early.validate(), Err(DomainError::Validation(m)) if m.contains("never activated")));
        }
    }
}

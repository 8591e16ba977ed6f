//! Condition check scheduling.
//!
//! Decides which conditions are due for a re-check on this tick and in what
//! order. Pure functions over borrowed branches; nothing here touches the
//! evaluator or storage.

use chrono::{DateTime, Utc};

use crate::aggregates::StorylineBranch;
use crate::entities::BranchCondition;
use crate::ids::{BranchId, ConditionId};
use crate::value_objects::ConditionType;

/// A condition selected for evaluation on this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCondition {
    pub branch_id: BranchId,
    pub condition_id: ConditionId,
    pub condition_type: ConditionType,
    pub check_priority: u8,
    pub created_at: DateTime<Utc>,
}

/// Whether a condition should be re-checked at `now`.
///
/// Met conditions are never re-checked. Unmet ones are due when they have
/// never been checked or their type's check interval has elapsed.
pub fn is_due(condition: &BranchCondition, now: DateTime<Utc>) -> bool {
    if condition.is_met() {
        return false;
    }
    match condition.last_checked_at() {
        None => true,
        Some(last) => now - last >= condition.condition_type().check_interval(),
    }
}

/// Collect due conditions across branches, highest check priority first.
///
/// Dormant branches and branches past the pre-activation phase are skipped.
/// Ties on priority go to the older condition; remaining ties keep input order.
pub fn due_conditions(branches: &[StorylineBranch], now: DateTime<Utc>) -> Vec<DueCondition> {
    let mut due: Vec<DueCondition> = branches
        .iter()
        .filter(|b| b.is_active() && b.status().is_pre_activation())
        .flat_map(|branch| {
            branch
                .conditions()
                .iter()
                .filter(move |c| is_due(c, now))
                .map(move |c| DueCondition {
                    branch_id: branch.id(),
                    condition_id: c.id(),
                    condition_type: c.condition_type().clone(),
                    check_priority: c.condition_type().check_priority(),
                    created_at: c.created_at(),
                })
        })
        .collect();

    due.sort_by(|a, b| {
        b.check_priority
            .cmp(&a.check_priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    due
}

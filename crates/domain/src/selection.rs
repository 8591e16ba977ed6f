//! Activation selection.
//!
//! Picks which ready branches activate on a tick. Branch types that forbid
//! multiple instances allow at most one activated branch of that type at a
//! time: an activated holder blocks ready branches until it completes or is
//! closed.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::aggregates::StorylineBranch;
use crate::ids::BranchId;
use crate::status::BranchStatus;
use crate::value_objects::BranchType;

/// Result of one selection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Branches to activate, in activation order
    pub selected: Vec<BranchId>,
    /// Ready branches held back by an activated holder or a higher-priority
    /// branch of the same single-instance type. They stay ready.
    pub deferred: Vec<BranchId>,
}

/// Choose the ready branches to activate.
///
/// Candidates are active branches in `ReadyToActivate`. Ordering is priority
/// descending, then creation time ascending. Single-instance types already
/// held by an active, activated branch are claimed up front. Walking the
/// candidates, the first branch of an unclaimed single-instance type claims
/// it and later ones are deferred.
pub fn select_for_activation(branches: &[StorylineBranch]) -> Selection {
    let mut candidates: Vec<(i32, DateTime<Utc>, BranchType, BranchId)> = branches
        .iter()
        .filter(|b| b.is_active() && b.status() == BranchStatus::ReadyToActivate)
        .map(|b| (b.priority(), b.created_at(), b.branch_type(), b.id()))
        .collect();

    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let mut claimed: HashSet<BranchType> = branches
        .iter()
        .filter(|b| b.is_active() && b.status() == BranchStatus::Activated)
        .map(StorylineBranch::branch_type)
        .filter(|t| !t.allows_multiple_instances())
        .collect();
    let mut selection = Selection::default();
    for (_, _, branch_type, id) in candidates {
        if branch_type.allows_multiple_instances() || claimed.insert(branch_type) {
            selection.selected.push(id);
        } else {
            selection.deferred.push(id);
        }
    }
    selection
}

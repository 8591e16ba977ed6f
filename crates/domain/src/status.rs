//! Branch lifecycle status.
//!
//! Status is never stored. [`derive_status`] recomputes it from the activation
//! and completion timestamps plus the condition states of one borrowed
//! snapshot of the branch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::BranchCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchStatus {
    WaitingForConditions,
    ReadyToActivate,
    Activated,
    Completed,
    /// Forced by an operator; never derived
    Cancelled,
    /// Forced by an explicit expiry sweep; never derived
    Expired,
}

impl BranchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    /// Waiting and ready flip back and forth as conditions change.
    pub fn is_pre_activation(self) -> bool {
        matches!(self, Self::WaitingForConditions | Self::ReadyToActivate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForConditions => "WAITING_FOR_CONDITIONS",
            Self::ReadyToActivate => "READY_TO_ACTIVATE",
            Self::Activated => "ACTIVATED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derive the lifecycle status from a branch snapshot.
///
/// Returns only the four derivable states. An empty condition list counts as
/// fully met.
pub fn derive_status(
    activated_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    conditions: &[BranchCondition],
) -> BranchStatus {
    if completed_at.is_some() {
        return BranchStatus::Completed;
    }
    if activated_at.is_some() {
        return BranchStatus::Activated;
    }
    if conditions.iter().all(BranchCondition::is_met) {
        BranchStatus::ReadyToActivate
    } else {
        BranchStatus::WaitingForConditions
    }
}

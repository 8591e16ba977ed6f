//! StorylineBranch mutation outcomes.

use chrono::{DateTime, Utc};

use crate::ids::{ConditionId, EffectId};
use crate::status::BranchStatus;
use crate::value_objects::ActivationContext;

/// Outcome of a state-changing call on a storyline branch.
///
/// Lifecycle calls that don't apply (activating twice, completing a branch
/// that never activated, ...) are expected retries rather than errors, so they
/// come back as [`StorylineBranchUpdate::Unchanged`] with the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum StorylineBranchUpdate {
    Activated {
        at: DateTime<Utc>,
        context: ActivationContext,
    },
    Completed {
        at: DateTime<Utc>,
        reason: String,
    },
    Closed {
        status: BranchStatus,
        at: DateTime<Utc>,
        reason: String,
    },
    ActivationChanged { from: bool, to: bool },
    PriorityChanged { from: i32, to: i32 },
    ConditionAdded { condition_id: ConditionId },
    EffectAdded { effect_id: EffectId },
    EffectReset { effect_id: EffectId },
    Unchanged(NoChange),
}

impl StorylineBranchUpdate {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }

    /// The reason a call was refused, if it was.
    pub fn no_change(&self) -> Option<NoChange> {
        match self {
            Self::Unchanged(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Why a lifecycle call left the branch as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChange {
    /// Branch is inactive and was never activated
    Dormant,
    AlreadyActivated { at: DateTime<Utc> },
    AlreadyCompleted { at: DateTime<Utc> },
    /// Branch was force-closed (cancelled or expired)
    AlreadyClosed { status: BranchStatus },
    /// Completion requested for a branch that never activated
    NotActivated,
}

impl std::fmt::Display for NoChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dormant => write!(f, "branch is dormant"),
            Self::AlreadyActivated { at } => write!(f, "already activated at {}", at.to_rfc3339()),
            Self::AlreadyCompleted { at } => write!(f, "already completed at {}", at.to_rfc3339()),
            Self::AlreadyClosed { status } => write!(f, "already closed as {}", status),
            Self::NotActivated => write!(f, "branch was never activated"),
        }
    }
}

//! Booker domain: storyline branches and the pure rules that drive them.
//!
//! Nothing in this crate performs I/O or reads the clock. Every time-dependent
//! operation takes `now` from the caller.

extern crate self as booker_domain;

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod scheduling;
pub mod selection;
pub mod status;
pub mod value_objects;

pub use aggregates::{BranchClosure, ClosureKind, StorylineBranch};
pub use entities::{BranchCondition, BranchEffect, ConditionChange, FAILURE_MARKER};
pub use error::DomainError;
pub use events::{NoChange, StorylineBranchUpdate};
pub use ids::{BranchId, ConditionId, EffectId, SegmentId};
pub use scheduling::{due_conditions, is_due, DueCondition};
pub use selection::{select_for_activation, Selection};
pub use status::{derive_status, BranchStatus};
pub use value_objects::{
    ActivationContext, BranchName, BranchType, BranchTypeProfile, ConditionGroup,
    ConditionSchedule, ConditionType, Description, EffectGroup, EffectType,
};

//! Entities owned by the storyline branch aggregate

mod branch_condition;
mod branch_effect;

pub use branch_condition::{BranchCondition, ConditionChange};
pub use branch_effect::{BranchEffect, FAILURE_MARKER};

//! Aggregate roots - domain objects that own their related data
//!
//! Each aggregate:
//! - Has a unique identity
//! - Owns all its constituent parts (enforced by Rust ownership)
//! - Exposes behavior through methods, not public fields
//! - Returns update enums from mutations

pub mod storyline_branch;

pub use storyline_branch::{BranchClosure, ClosureKind, StorylineBranch};

//! Value objects - Immutable objects defined by their attributes

mod activation_context;
mod branch_type;
mod condition_type;
mod effect_type;
mod names;

pub use activation_context::ActivationContext;
pub use branch_type::{BranchType, BranchTypeProfile};
pub use condition_type::{ConditionGroup, ConditionSchedule, ConditionType};
pub use effect_type::{EffectGroup, EffectType};
pub use names::{BranchName, Description};

//! Domain events emitted by aggregate mutations

mod branch_events;

pub use branch_events::{NoChange, StorylineBranchUpdate};

//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Branch storage (in-memory today, a database later)
//! - Condition evaluation and effect execution (owned by other subsystems)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{EffectError, EvaluationError, RepoError};
pub use external::*;
pub use repos::*;
pub use testing::*;

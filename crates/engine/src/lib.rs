//! Booker Engine library.
//!
//! Drives storyline branches forward: evaluates due conditions, activates
//! ready branches and executes their effects, one tick at a time.
//!
//! ## Structure
//!
//! - `use_cases/` - Tick runner, activation engine, effect pipeline, management
//! - `infrastructure/` - Ports plus adapters (clock, in-memory store, registries, config)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Scenario tests driving full ticks through the in-memory store.
#[cfg(test)]
mod e2e_tests;

pub use app::App;

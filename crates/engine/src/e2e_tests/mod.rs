//! Engine E2E tests.
//!
//! These tests drive complete ticks through a fully wired [`crate::App`]:
//! - In-memory branch repository
//! - Fact book evaluators and handlers (mocks where a scenario needs failures)
//! - Manual clock, advanced explicitly between ticks
//!
//! ```bash
//! cargo test -p booker-engine --lib e2e_tests
//! ```

mod e2e_helpers;
mod effect_pipeline_tests;

pub use e2e_helpers::*;

//! Runner configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BOOKER_TICK_INTERVAL_SECS` | 60 | Seconds between ticks |
//! | `BOOKER_EXPIRY_DAYS` | unset | Expire stale never-activated branches once at startup |
//! | `BOOKER_MAX_TICKS` | unset | Stop after this many ticks |
//! | `BOOKER_SEED_FILE` | unset | JSON file with branches and facts to load at startup |
//!
//! Malformed values are logged and replaced by the default.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub tick_interval: Duration,
    pub expiry_days: Option<u32>,
    pub max_ticks: Option<u64>,
    pub seed_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            expiry_days: None,
            max_ticks: None,
            seed_file: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map instead of the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let tick_secs = match parse_var::<u64>(&lookup, "BOOKER_TICK_INTERVAL_SECS") {
            Some(0) => {
                tracing::warn!("BOOKER_TICK_INTERVAL_SECS must be positive, using default");
                DEFAULT_TICK_INTERVAL_SECS
            }
            Some(secs) => secs,
            None => DEFAULT_TICK_INTERVAL_SECS,
        };

        Self {
            tick_interval: Duration::from_secs(tick_secs),
            expiry_days: parse_var(&lookup, "BOOKER_EXPIRY_DAYS"),
            max_ticks: parse_var(&lookup, "BOOKER_MAX_TICKS"),
            seed_file: lookup("BOOKER_SEED_FILE")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, value = %raw, error = %e, "Ignoring malformed setting");
            None
        }
    }
}

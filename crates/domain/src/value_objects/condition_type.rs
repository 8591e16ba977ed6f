//! Condition types and their re-check cadence.
//!
//! Condition types are free strings supplied by whoever authors the branch
//! (`WRESTLER_WINS`, `HEAT_THRESHOLD`, ...). Each name falls into a
//! [`ConditionGroup`], and the group decides how urgently and how often the
//! scheduler asks the evaluator about it.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::branch_type::normalize_type_name;
use crate::error::DomainError;

/// Normalized (upper snake case) condition type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConditionType(String);

impl ConditionType {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = normalize_type_name(raw.as_ref());
        if normalized.is_empty() {
            return Err(DomainError::validation("Condition type cannot be empty"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn group(&self) -> ConditionGroup {
        ConditionGroup::classify(&self.0)
    }

    /// Higher values are checked first within a pass.
    pub fn check_priority(&self) -> u8 {
        self.group().schedule().check_priority
    }

    pub fn check_interval(&self) -> Duration {
        self.group().schedule().check_interval()
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ConditionType {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ConditionType> for String {
    fn from(t: ConditionType) -> String {
        t.0
    }
}

/// Cadence bucket a condition type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionGroup {
    /// Live match/segment outcomes and title state
    SegmentOutcome,
    /// Injuries, backstage drama and fan swings
    Incident,
    /// Rivalry heat and faction membership
    Rivalry,
    /// Operator-defined or externally reported facts
    External,
    /// Dates, show counts and season progress
    Calendar,
    /// Anything the table doesn't know about
    Unclassified,
}

/// Scheduling data for one [`ConditionGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionSchedule {
    pub check_priority: u8,
    check_interval_secs: i64,
}

impl ConditionSchedule {
    pub fn check_interval(&self) -> Duration {
        Duration::seconds(self.check_interval_secs)
    }
}

const HOUR: i64 = 60 * 60;

const SCHEDULES: [ConditionSchedule; 6] = [
    ConditionSchedule {
        check_priority: 10,
        check_interval_secs: HOUR,
    },
    ConditionSchedule {
        check_priority: 8,
        check_interval_secs: 3 * HOUR,
    },
    ConditionSchedule {
        check_priority: 6,
        check_interval_secs: 6 * HOUR,
    },
    ConditionSchedule {
        check_priority: 4,
        check_interval_secs: 12 * HOUR,
    },
    ConditionSchedule {
        check_priority: 2,
        check_interval_secs: 24 * HOUR,
    },
    ConditionSchedule {
        check_priority: 0,
        check_interval_secs: 24 * HOUR,
    },
];

impl ConditionGroup {
    pub fn classify(normalized: &str) -> Self {
        match normalized {
            "WRESTLER_WINS" | "WRESTLER_LOSES" | "MATCH_TYPE" | "STIPULATION" | "TITLE_HOLDER"
            | "TITLE_VACANT" | "CHALLENGER" => Self::SegmentOutcome,
            "WRESTLER_INJURED" | "INJURY_SEVERITY" | "RECOVERY_TIME" | "DRAMA_TYPE"
            | "DRAMA_SEVERITY" | "FAN_THRESHOLD" | "FAN_CHANGE" | "WRESTLER_TIER" => {
                Self::Incident
            }
            "HEAT_THRESHOLD" | "RIVALRY_ACTIVE" | "WRESTLERS_INVOLVED" | "FACTION_MEMBER"
            | "FACTION_ACTIVE" | "MEMBER_COUNT" => Self::Rivalry,
            "CUSTOM_CONDITION" | "EXTERNAL_EVENT" => Self::External,
            "SEASON_ACTIVE" | "SHOW_COUNT" | "DATE_RANGE" | "DATE_REACHED" | "DAYS_PASSED" => {
                Self::Calendar
            }
            other if other.starts_with("CUSTOM_") => Self::External,
            _ => Self::Unclassified,
        }
    }

    pub fn schedule(self) -> &'static ConditionSchedule {
        &SCHEDULES[self as usize]
    }
}

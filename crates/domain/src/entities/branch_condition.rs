//! BranchCondition entity - one gate a storyline branch waits on
//!
//! The engine never decides whether a condition holds. It only decides *when*
//! to ask an evaluator, and records the answer here. The met timestamp doubles
//! as the met flag, so a condition can't be "met" without knowing since when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ConditionId;
use crate::value_objects::{ConditionType, Description};

/// What recording an evaluator answer did to the condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionChange {
    BecameMet,
    BecameUnmet,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchCondition {
    id: ConditionId,
    condition_type: ConditionType,
    key: String,
    value: String,
    description: Description,
    met_at: Option<DateTime<Utc>>,
    last_checked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl BranchCondition {
    pub fn new(
        condition_type: ConditionType,
        key: impl Into<String>,
        value: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ConditionId::new(),
            condition_type,
            key: key.into(),
            value: value.into(),
            description: Description::empty(),
            met_at: None,
            last_checked_at: None,
            created_at: now,
        }
    }

    // =========================================================================
    // Builder Methods (for construction and loading)
    // =========================================================================

    pub fn with_id(mut self, id: ConditionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = description;
        self
    }

    /// Restore evaluation bookkeeping (used when loading from storage).
    pub fn with_check_state(
        mut self,
        met_at: Option<DateTime<Utc>>,
        last_checked_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.met_at = met_at;
        self.last_checked_at = last_checked_at;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> ConditionId {
        self.id
    }

    #[inline]
    pub fn condition_type(&self) -> &ConditionType {
        &self.condition_type
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    #[inline]
    pub fn is_met(&self) -> bool {
        self.met_at.is_some()
    }

    #[inline]
    pub fn met_at(&self) -> Option<DateTime<Utc>> {
        self.met_at
    }

    #[inline]
    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // =========================================================================
    // Evaluation Bookkeeping
    // =========================================================================

    /// Record an evaluator answer. Always stamps the check time.
    pub fn record_check(&mut self, met: bool, now: DateTime<Utc>) -> ConditionChange {
        self.last_checked_at = Some(now);
        match (self.is_met(), met) {
            (false, true) => {
                self.met_at = Some(now);
                ConditionChange::BecameMet
            }
            (true, false) => {
                self.met_at = None;
                ConditionChange::BecameUnmet
            }
            _ => ConditionChange::Unchanged,
        }
    }

    /// Record an evaluation attempt that produced no answer.
    ///
    /// The met state is left alone; only the check time moves so a broken
    /// evaluator is retried on the normal cadence rather than every pass.
    pub fn record_failed_check(&mut self, now: DateTime<Utc>) {
        self.last_checked_at = Some(now);
    }

    pub fn display_string(&self) -> String {
        let status = if self.is_met() { "✅ MET" } else { "⏳ PENDING" };
        if self.description.is_empty() {
            format!(
                "{}: {} = {} [{}]",
                self.condition_type, self.key, self.value, status
            )
        } else {
            format!("{}: {} [{}]", self.condition_type, self.description, status)
        }
    }
}

//! BranchEffect entity - one downstream action fired when a branch activates
//!
//! Effects execute at most once under normal flow. A handler failure still
//! marks the effect executed, with the failure recorded as the outcome text, so
//! a handler that always fails isn't retried forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::EffectId;
use crate::value_objects::{Description, EffectType};

/// Prefix written into the outcome text when the handler failed.
pub const FAILURE_MARKER: &str = "FAILED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
enum ExecutionState {
    Pending,
    Executed { at: DateTime<Utc>, result: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchEffect {
    id: EffectId,
    effect_type: EffectType,
    key: String,
    value: String,
    description: Description,
    /// Ascending; effects past 1 are expected to build on lower-order siblings
    execution_order: u32,
    execution: ExecutionState,
    created_at: DateTime<Utc>,
}

impl BranchEffect {
    /// Create a pending effect. An order of 0 is normalized to 1.
    pub fn new(
        effect_type: EffectType,
        key: impl Into<String>,
        value: impl Into<String>,
        execution_order: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EffectId::new(),
            effect_type,
            key: key.into(),
            value: value.into(),
            description: Description::empty(),
            execution_order: execution_order.max(1),
            execution: ExecutionState::Pending,
            created_at: now,
        }
    }

    // =========================================================================
    // Builder Methods (for construction and loading)
    // =========================================================================

    pub fn with_id(mut self, id: EffectId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = description;
        self
    }

    /// Restore an executed state (used when loading from storage).
    pub fn with_executed(mut self, at: DateTime<Utc>, result: impl Into<String>) -> Self {
        self.execution = ExecutionState::Executed {
            at,
            result: result.into(),
        };
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> EffectId {
        self.id
    }

    #[inline]
    pub fn effect_type(&self) -> &EffectType {
        &self.effect_type
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
    pub fn execution_order(&self) -> u32 {
        self.execution_order
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn is_executed(&self) -> bool {
        matches!(self.execution, ExecutionState::Executed { .. })
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        match &self.execution {
            ExecutionState::Executed { at, .. } => Some(*at),
            ExecutionState::Pending => None,
        }
    }

    pub fn execution_result(&self) -> Option<&str> {
        match &self.execution {
            ExecutionState::Executed { result, .. } => Some(result),
            ExecutionState::Pending => None,
        }
    }

    /// Effects with an order above 1 nominally depend on lower-order siblings.
    /// Nothing enforces it.
    pub fn has_dependencies(&self) -> bool {
        self.execution_order > 1
    }

    pub fn was_executed_successfully(&self) -> bool {
        match self.execution_result() {
            Some(result) => {
                let lowered = result.to_lowercase();
                !lowered.contains("failed") && !lowered.contains("error")
            }
            None => false,
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Record a successful execution. Returns false if already executed.
    pub fn mark_executed(&mut self, result: impl Into<String>, now: DateTime<Utc>) -> bool {
        if self.is_executed() {
            return false;
        }
        self.execution = ExecutionState::Executed {
            at: now,
            result: result.into(),
        };
        true
    }

    /// Record a failed execution. The effect still counts as executed.
    pub fn mark_failed(&mut self, error: impl std::fmt::Display, now: DateTime<Utc>) -> bool {
        self.mark_executed(format!("{}: {}", FAILURE_MARKER, error), now)
    }

    /// Operator correction only; normal flow never un-executes an effect.
    pub fn reset_execution(&mut self) {
        self.execution = ExecutionState::Pending;
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn display_string(&self) -> String {
        let status = if self.is_executed() {
            "✅ EXECUTED"
        } else {
            "⏳ PENDING"
        };
        format!("{}: {} [{}]", self.effect_type, self.description, status)
    }

    pub fn summary(&self) -> String {
        let mut summary = format!("{} - ", self.effect_type);
        if self.description.is_empty() {
            summary.push_str(&format!("{} = {}", self.key, self.value));
        } else {
            summary.push_str(self.description.as_str());
        }
        if let Some(at) = self.executed_at() {
            summary.push_str(&format!(" (Executed on {})", at.to_rfc3339()));
        }
        summary
    }
}

//! Error types for port operations.

use booker_domain::ConditionType;
use booker_domain::EffectType;

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Storage operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure while asking whether a condition holds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// Configuration error: nothing can answer for this condition type.
    #[error("No evaluator registered for condition type {0}")]
    NoEvaluator(ConditionType),
    #[error("Evaluation failed: {0}")]
    Failed(String),
}

impl EvaluationError {
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Failure while carrying out an effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    /// Configuration error: nothing can carry out this effect type.
    #[error("No handler registered for effect type {0}")]
    NoHandler(EffectType),
    #[error("Effect failed: {0}")]
    Failed(String),
}

impl EffectError {
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }
}

//! External collaborator ports: condition truth and effect execution.
//!
//! The engine decides *when* to ask and *what order* to act in. Whether a
//! condition actually holds, and what an effect does to the rest of the
//! promotion, lives behind these traits.

use async_trait::async_trait;
use booker_domain::{ConditionType, EffectType};

use super::error::{EffectError, EvaluationError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConditionEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        condition_type: &ConditionType,
        key: &str,
        value: &str,
    ) -> Result<bool, EvaluationError>;
}

/// Carries out one effect and returns a human-readable result line.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EffectHandler: Send + Sync {
    async fn execute(
        &self,
        effect_type: &EffectType,
        key: &str,
        value: &str,
    ) -> Result<String, EffectError>;
}

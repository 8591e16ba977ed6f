//! Per-type dispatch for condition evaluators and effect handlers.
//!
//! Both registries implement the port they dispatch to, so use cases hold a
//! single `Arc<dyn ConditionEvaluator>` / `Arc<dyn EffectHandler>` no matter
//! how many subsystems answer behind it. A type with no registration and no
//! fallback is a configuration error for that one condition or effect.

use std::sync::Arc;

use async_trait::async_trait;
use booker_domain::{ConditionType, EffectType};
use dashmap::DashMap;

use crate::infrastructure::ports::{
    ConditionEvaluator, EffectError, EffectHandler, EvaluationError,
};

// =============================================================================
// Condition Evaluators
// =============================================================================

#[derive(Default)]
pub struct EvaluatorRegistry {
    evaluators: DashMap<ConditionType, Arc<dyn ConditionEvaluator>>,
    fallback: Option<Arc<dyn ConditionEvaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer for every type without its own registration.
    pub fn with_fallback(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.fallback = Some(evaluator);
        self
    }

    /// Register (or replace) the evaluator for one condition type.
    pub fn register(&self, condition_type: ConditionType, evaluator: Arc<dyn ConditionEvaluator>) {
        tracing::debug!(condition_type = %condition_type, "Registered condition evaluator");
        self.evaluators.insert(condition_type, evaluator);
    }

    pub fn is_registered(&self, condition_type: &ConditionType) -> bool {
        self.evaluators.contains_key(condition_type)
    }

    fn lookup(&self, condition_type: &ConditionType) -> Option<Arc<dyn ConditionEvaluator>> {
        self.evaluators
            .get(condition_type)
            .map(|entry| Arc::clone(entry.value()))
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ConditionEvaluator for EvaluatorRegistry {
    async fn evaluate(
        &self,
        condition_type: &ConditionType,
        key: &str,
        value: &str,
    ) -> Result<bool, EvaluationError> {
        // Clone the Arc out so no map guard is held across the await
        let evaluator = self
            .lookup(condition_type)
            .ok_or_else(|| EvaluationError::NoEvaluator(condition_type.clone()))?;
        evaluator.evaluate(condition_type, key, value).await
    }
}

// =============================================================================
// Effect Handlers
// =============================================================================

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<EffectType, Arc<dyn EffectHandler>>,
    fallback: Option<Arc<dyn EffectHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, handler: Arc<dyn EffectHandler>) -> Self {
        self.fallback = Some(handler);
        self
    }

    pub fn register(&self, effect_type: EffectType, handler: Arc<dyn EffectHandler>) {
        tracing::debug!(effect_type = %effect_type, "Registered effect handler");
        self.handlers.insert(effect_type, handler);
    }

    pub fn is_registered(&self, effect_type: &EffectType) -> bool {
        self.handlers.contains_key(effect_type)
    }

    fn lookup(&self, effect_type: &EffectType) -> Option<Arc<dyn EffectHandler>> {
        self.handlers
            .get(effect_type)
            .map(|entry| Arc::clone(entry.value()))
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl EffectHandler for HandlerRegistry {
    async fn execute(
        &self,
        effect_type: &EffectType,
        key: &str,
        value: &str,
    ) -> Result<String, EffectError> {
        let handler = self
            .lookup(effect_type)
            .ok_or_else(|| EffectError::NoHandler(effect_type.clone()))?;
        handler.execute(effect_type, key, value).await
    }
}

//! Fact book: a shared key/value store of promotion facts.
//!
//! The runner binary answers conditions from it and lets effects write back
//! into it, so one branch's effects can satisfy another branch's conditions.
//! Keys are free-form (`"title:world"`, `"rivalry:ace-vs-jet:heat"`).

use std::sync::Arc;

use async_trait::async_trait;
use booker_domain::{ConditionType, EffectType};
use dashmap::DashMap;

use crate::infrastructure::ports::{
    ConditionEvaluator, EffectError, EffectHandler, EvaluationError,
};

#[derive(Debug, Default)]
pub struct FactBook {
    facts: DashMap<String, String>,
}

impl FactBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: impl Into<String>, value: impl Into<String>) {
        self.facts.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.facts.get(key).map(|entry| entry.value().clone())
    }

    pub fn forget(&self, key: &str) -> Option<String> {
        self.facts.remove(key).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// How a fact is compared against a condition's expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactMatch {
    /// Fact equals the expected value (trimmed, case-insensitive)
    Exact,
    /// Fact and expected value are integers and fact >= expected
    AtLeast,
}

/// Answers conditions by looking the condition key up in the fact book.
///
/// A missing fact means the condition does not hold yet.
pub struct FactEvaluator {
    facts: Arc<FactBook>,
    mode: FactMatch,
}

impl FactEvaluator {
    pub fn exact(facts: Arc<FactBook>) -> Self {
        Self {
            facts,
            mode: FactMatch::Exact,
        }
    }

    pub fn at_least(facts: Arc<FactBook>) -> Self {
        Self {
            facts,
            mode: FactMatch::AtLeast,
        }
    }
}

#[async_trait]
impl ConditionEvaluator for FactEvaluator {
    async fn evaluate(
        &self,
        _condition_type: &ConditionType,
        key: &str,
        value: &str,
    ) -> Result<bool, EvaluationError> {
        let Some(fact) = self.facts.get(key) else {
            return Ok(false);
        };
        match self.mode {
            FactMatch::Exact => Ok(fact.trim().eq_ignore_ascii_case(value.trim())),
            FactMatch::AtLeast => {
                let actual = parse_number(key, &fact)?;
                let expected = parse_number(key, value)?;
                Ok(actual >= expected)
            }
        }
    }
}

fn parse_number(key: &str, raw: &str) -> Result<i64, EvaluationError> {
    raw.trim().parse::<i64>().map_err(|e| {
        EvaluationError::failed(format!("'{}' for {} is not a number: {}", raw, key, e))
    })
}

/// Carries out an effect by recording `key = value` in the fact book.
pub struct FactEffectHandler {
    facts: Arc<FactBook>,
}

impl FactEffectHandler {
    pub fn new(facts: Arc<FactBook>) -> Self {
        Self { facts }
    }
}

#[async_trait]
impl EffectHandler for FactEffectHandler {
    async fn execute(
        &self,
        effect_type: &EffectType,
        key: &str,
        value: &str,
    ) -> Result<String, EffectError> {
        if key.trim().is_empty() {
            return Err(EffectError::failed(format!(
                "{} has no target key",
                effect_type
            )));
        }
        self.facts.record(key, value);
        tracing::info!(effect_type = %effect_type, key = %key, value = %value, "Fact recorded");
        Ok(format!("{}: {} = {}", effect_type, key, value))
    }
}

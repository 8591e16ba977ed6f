//! Effect types and their execution metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::branch_type::normalize_type_name;
use crate::error::DomainError;

/// Normalized (upper snake case) effect type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EffectType(String);

/// Domain area an effect touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectGroup {
    Rivalry,
    Faction,
    Match,
    Wrestler,
    Storyline,
    Other,
}

impl EffectType {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = normalize_type_name(raw.as_ref());
        if normalized.is_empty() {
            return Err(DomainError::validation("Effect type cannot be empty"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn group(&self) -> EffectGroup {
        match self.0.as_str() {
            "CREATE_RIVALRY" | "ADD_HEAT" | "ESCALATE_HEAT" | "END_RIVALRY" => EffectGroup::Rivalry,
            "CREATE_FACTION" | "ADD_MEMBER" | "REMOVE_MEMBER" | "DISBAND_FACTION" => {
                EffectGroup::Faction
            }
            "FORCE_MATCH" | "ADD_STIPULATION" | "TITLE_SHOT" | "SPECIAL_MATCH" => EffectGroup::Match,
            "AWARD_FANS" | "CHANGE_ALIGNMENT" | "TIER_PROMOTION" | "INJURY_WRESTLER" => {
                EffectGroup::Wrestler
            }
            "CREATE_STORYLINE" | "END_STORYLINE" | "STORYLINE_TWIST" | "NARRATIVE_CHANGE" => {
                EffectGroup::Storyline
            }
            _ => EffectGroup::Other,
        }
    }

    /// Tie-break among effects sharing an execution order (higher runs first).
    pub fn execution_priority(&self) -> u8 {
        match self.0.as_str() {
            "CREATE_RIVALRY" | "ADD_HEAT" => 10,
            "FORCE_MATCH" | "TITLE_SHOT" => 9,
            "CREATE_FACTION" | "ADD_MEMBER" => 8,
            "AWARD_FANS" | "CHANGE_ALIGNMENT" => 6,
            "CREATE_STORYLINE" | "STORYLINE_TWIST" => 4,
            _ => 2,
        }
    }

    pub fn should_execute_immediately(&self) -> bool {
        matches!(self.group(), EffectGroup::Rivalry | EffectGroup::Match)
    }

    pub fn can_be_delayed(&self) -> bool {
        self.group() == EffectGroup::Storyline || self.0.starts_with("CUSTOM_")
    }

    /// Advisory delay before the effect should land. The pipeline never waits on it.
    pub fn recommended_delay_hours(&self) -> u32 {
        match self.group() {
            EffectGroup::Rivalry | EffectGroup::Match => 0,
            EffectGroup::Faction | EffectGroup::Wrestler => 1,
            EffectGroup::Storyline => 24,
            EffectGroup::Other => 6,
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EffectType {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<EffectType> for String {
    fn from(t: EffectType) -> String {
        t.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn et(s: &str) -> EffectType {
        EffectType::new(s).unwrap()
    }

    #[test]
    fn execution_priorities() {
        assert_eq!(et("create_rivalry").execution_priority(), 10);
        assert_eq!(et("TITLE_SHOT").execution_priority(), 9);
        assert_eq!(et("ADD_MEMBER").execution_priority(), 8);
        assert_eq!(et("AWARD_FANS").execution_priority(), 6);
        assert_eq!(et("STORYLINE_TWIST").execution_priority(), 4);
        assert_eq!(et("FINE").execution_priority(), 2);
    }

    #[test]
    fn delays_follow_group() {
        assert_eq!(et("ADD_HEAT").recommended_delay_hours(), 0);
        assert_eq!(et("FORCE_MATCH").recommended_delay_hours(), 0);
        assert_eq!(et("DISBAND_FACTION").recommended_delay_hours(), 1);
        assert_eq!(et("TIER_PROMOTION").recommended_delay_hours(), 1);
        assert_eq!(et("END_STORYLINE").recommended_delay_hours(), 24);
        assert_eq!(et("SUSPENSION").recommended_delay_hours(), 6);
    }

    #[test]
    fn delayable_effects() {
        assert!(et("NARRATIVE_CHANGE").can_be_delayed());
        assert!(et("CUSTOM_PROMO").can_be_delayed());
        assert!(!et("ADD_HEAT").can_be_delayed());
        assert!(et("ADD_HEAT").should_execute_immediately());
    }
}

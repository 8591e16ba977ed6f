//! Storyline branch types and their scheduling profile.
//!
//! Every branch carries one `BranchType`. The type decides the branch's default
//! priority and whether several branches of the same type may be ready or
//! active at once. The per-type values live in a single lookup table so the
//! selector reads data rather than dispatching on the variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchType {
    /// Triggered by segment results (winner/loser specific)
    MatchOutcome,
    /// Triggered by rivalry heat reaching thresholds
    RivalryEscalation,
    /// Triggered by faction formation, betrayal, or dissolution
    FactionDynamics,
    /// Triggered by championship wins or losses
    TitleChange,
    /// Triggered by wrestler injuries
    InjuryResponse,
    /// Triggered by backstage drama or incidents
    DramaResponse,
    /// Triggered by significant fan count changes
    FanReaction,
    /// Triggered by season progression or special events
    SeasonalEvent,
    /// Triggered by external storyline factors
    ExternalTrigger,
    /// Triggered by time passing or specific dates
    TimeBased,
}

/// Static per-type data consulted by the selector and by branch creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchTypeProfile {
    pub display_name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
    /// Priority given to new branches that don't specify one (higher = first)
    pub default_priority: i32,
    /// How soon a branch of this type typically activates once created
    pub activation_window_days: u32,
    /// Whether several branches of this type may be selected in one pass
    pub allows_multiple_instances: bool,
    pub suggested_condition_types: &'static [&'static str],
    pub suggested_effect_types: &'static [&'static str],
}

const PROFILES: [BranchTypeProfile; 10] = [
    BranchTypeProfile {
        display_name: "Match Outcome",
        description: "Branch triggered by specific segment results",
        emoji: "🏆",
        default_priority: 8,
        activation_window_days: 1,
        allows_multiple_instances: true,
        suggested_condition_types: &["WRESTLER_WINS", "WRESTLER_LOSES", "MATCH_TYPE", "STIPULATION"],
        suggested_effect_types: &["CREATE_RIVALRY", "ADD_HEAT", "CHANGE_ALIGNMENT", "AWARD_FANS"],
    },
    BranchTypeProfile {
        display_name: "Rivalry Escalation",
        description: "Branch triggered by rivalry heat reaching thresholds",
        emoji: "🔥",
        default_priority: 8,
        activation_window_days: 3,
        allows_multiple_instances: true,
        suggested_condition_types: &["HEAT_THRESHOLD", "RIVALRY_ACTIVE", "WRESTLERS_INVOLVED"],
        suggested_effect_types: &["FORCE_MATCH", "ADD_STIPULATION", "ESCALATE_HEAT"],
    },
    BranchTypeProfile {
        display_name: "Faction Dynamics",
        description: "Branch triggered by faction formation, betrayal, or dissolution",
        emoji: "👥",
        default_priority: 6,
        activation_window_days: 7,
        allows_multiple_instances: false,
        suggested_condition_types: &["FACTION_MEMBER", "FACTION_ACTIVE", "MEMBER_COUNT"],
        suggested_effect_types: &["CREATE_FACTION", "ADD_MEMBER", "REMOVE_MEMBER", "DISBAND_FACTION"],
    },
    BranchTypeProfile {
        display_name: "Title Change",
        description: "Branch triggered by championship wins or losses",
        emoji: "🏅",
        default_priority: 10,
        activation_window_days: 1,
        allows_multiple_instances: false,
        suggested_condition_types: &["TITLE_HOLDER", "TITLE_VACANT", "CHALLENGER"],
        suggested_effect_types: &["TITLE_SHOT", "CONTENDER_TOURNAMENT", "TITLE_FEUD"],
    },
    BranchTypeProfile {
        display_name: "Injury Response",
        description: "Branch triggered by wrestler injuries",
        emoji: "🏥",
        default_priority: 6,
        activation_window_days: 3,
        allows_multiple_instances: true,
        suggested_condition_types: &["WRESTLER_INJURED", "INJURY_SEVERITY", "RECOVERY_TIME"],
        suggested_effect_types: &["REPLACEMENT_WRESTLER", "SYMPATHY_FANS", "REVENGE_ANGLE"],
    },
    BranchTypeProfile {
        display_name: "Drama Response",
        description: "Branch triggered by backstage drama or incidents",
        emoji: "🎭",
        default_priority: 4,
        activation_window_days: 7,
        allows_multiple_instances: true,
        suggested_condition_types: &["DRAMA_TYPE", "DRAMA_SEVERITY", "WRESTLERS_INVOLVED"],
        suggested_effect_types: &["SUSPENSION", "FINE", "MANDATORY_MATCH", "HEAT_PENALTY"],
    },
    BranchTypeProfile {
        display_name: "Fan Reaction",
        description: "Branch triggered by significant fan count changes",
        emoji: "👏",
        default_priority: 4,
        activation_window_days: 14,
        allows_multiple_instances: true,
        suggested_condition_types: &["FAN_THRESHOLD", "FAN_CHANGE", "WRESTLER_TIER"],
        suggested_effect_types: &["TIER_PROMOTION", "TITLE_OPPORTUNITY", "SPECIAL_MATCH"],
    },
    BranchTypeProfile {
        display_name: "Seasonal Event",
        description: "Branch triggered by season progression or special events",
        emoji: "📅",
        default_priority: 3,
        activation_window_days: 30,
        allows_multiple_instances: false,
        suggested_condition_types: &["SEASON_ACTIVE", "SHOW_COUNT", "DATE_RANGE"],
        suggested_effect_types: &["TOURNAMENT", "SPECIAL_SHOW", "SEASON_FINALE"],
    },
    BranchTypeProfile {
        display_name: "External Trigger",
        description: "Branch triggered by external storyline factors",
        emoji: "🌟",
        default_priority: 3,
        activation_window_days: 14,
        allows_multiple_instances: false,
        suggested_condition_types: &["CUSTOM_CONDITION", "EXTERNAL_EVENT"],
        suggested_effect_types: &["CUSTOM_EFFECT", "STORYLINE_TWIST"],
    },
    BranchTypeProfile {
        display_name: "Time-Based",
        description: "Branch triggered by time passing or specific dates",
        emoji: "⏰",
        default_priority: 2,
        activation_window_days: 365,
        allows_multiple_instances: false,
        suggested_condition_types: &["DATE_REACHED", "DAYS_PASSED", "SHOW_COUNT"],
        suggested_effect_types: &["AUTOMATIC_PROGRESSION", "DEADLINE_EFFECT", "ANNIVERSARY_EVENT"],
    },
];

impl BranchType {
    pub const ALL: [BranchType; 10] = [
        Self::MatchOutcome,
        Self::RivalryEscalation,
        Self::FactionDynamics,
        Self::TitleChange,
        Self::InjuryResponse,
        Self::DramaResponse,
        Self::FanReaction,
        Self::SeasonalEvent,
        Self::ExternalTrigger,
        Self::TimeBased,
    ];

    /// Returns the static profile for this branch type.
    pub fn profile(self) -> &'static BranchTypeProfile {
        &PROFILES[self as usize]
    }

    pub fn default_priority(self) -> i32 {
        self.profile().default_priority
    }

    pub fn allows_multiple_instances(self) -> bool {
        self.profile().allows_multiple_instances
    }

    pub fn activation_window_days(self) -> u32 {
        self.profile().activation_window_days
    }

    pub fn display_name(self) -> &'static str {
        self.profile().display_name
    }

    /// Display name prefixed with the type's emoji.
    pub fn display_with_emoji(self) -> String {
        let profile = self.profile();
        format!("{} {}", profile.emoji, profile.display_name)
    }

    pub fn is_match_related(self) -> bool {
        matches!(self, Self::MatchOutcome | Self::TitleChange)
    }

    pub fn is_rivalry_related(self) -> bool {
        matches!(self, Self::RivalryEscalation | Self::FactionDynamics)
    }

    pub fn is_event_driven(self) -> bool {
        matches!(
            self,
            Self::DramaResponse | Self::InjuryResponse | Self::SeasonalEvent
        )
    }

    pub fn is_time_sensitive(self) -> bool {
        matches!(self, Self::TimeBased | Self::SeasonalEvent)
    }

    /// Canonical upper snake case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MatchOutcome => "MATCH_OUTCOME",
            Self::RivalryEscalation => "RIVALRY_ESCALATION",
            Self::FactionDynamics => "FACTION_DYNAMICS",
            Self::TitleChange => "TITLE_CHANGE",
            Self::InjuryResponse => "INJURY_RESPONSE",
            Self::DramaResponse => "DRAMA_RESPONSE",
            Self::FanReaction => "FAN_REACTION",
            Self::SeasonalEvent => "SEASONAL_EVENT",
            Self::ExternalTrigger => "EXTERNAL_TRIGGER",
            Self::TimeBased => "TIME_BASED",
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BranchType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_type_name(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| DomainError::parse(format!("Unknown branch type: {}", s)))
    }
}

/// Normalizes a free-form type name to upper snake case.
///
/// `"title change"`, `"title-change"` and `"TITLE_CHANGE"` all map to `"TITLE_CHANGE"`.
pub(crate) fn normalize_type_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_table_is_aligned_with_variants() {
        assert_eq!(BranchType::TitleChange.display_name(), "Title Change");
        assert_eq!(BranchType::TimeBased.display_name(), "Time-Based");
        assert_eq!(BranchType::FanReaction.display_name(), "Fan Reaction");
    }

    #[test]
    fn default_priorities() {
        assert_eq!(BranchType::TitleChange.default_priority(), 10);
        assert_eq!(BranchType::MatchOutcome.default_priority(), 8);
        assert_eq!(BranchType::RivalryEscalation.default_priority(), 8);
        assert_eq!(BranchType::FactionDynamics.default_priority(), 6);
        assert_eq!(BranchType::DramaResponse.default_priority(), 4);
        assert_eq!(BranchType::ExternalTrigger.default_priority(), 3);
        assert_eq!(BranchType::TimeBased.default_priority(), 2);
    }

    #[test]
    fn multiplicity() {
        let multi: Vec<_> = BranchType::ALL
            .into_iter()
            .filter(|t| t.allows_multiple_instances())
            .collect();
        assert_eq!(
            multi,
            vec![
                BranchType::MatchOutcome,
                BranchType::RivalryEscalation,
                BranchType::InjuryResponse,
                BranchType::DramaResponse,
                BranchType::FanReaction,
            ]
        );
    }

    #[test]
    fn activation_windows() {
        assert_eq!(BranchType::MatchOutcome.activation_window_days(), 1);
        assert_eq!(BranchType::InjuryResponse.activation_window_days(), 3);
        assert_eq!(BranchType::SeasonalEvent.activation_window_days(), 30);
        assert_eq!(BranchType::TimeBased.activation_window_days(), 365);
    }

    #[test]
    fn parses_loose_spellings() {
        assert_eq!(
            "title change".parse::<BranchType>().unwrap(),
            BranchType::TitleChange
        );
        assert_eq!(
            "Rivalry-Escalation".parse::<BranchType>().unwrap(),
            BranchType::RivalryEscalation
        );
        assert!("WRESTLEMANIA".parse::<BranchType>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for t in BranchType::ALL {
            assert_eq!(t.to_string().parse::<BranchType>().unwrap(), t);
        }
    }

    #[test]
    fn classification_predicates() {
        assert!(BranchType::TitleChange.is_match_related());
        assert!(BranchType::FactionDynamics.is_rivalry_related());
        assert!(BranchType::SeasonalEvent.is_event_driven());
        assert!(BranchType::SeasonalEvent.is_time_sensitive());
        assert!(!BranchType::FanReaction.is_time_sensitive());
    }
}

//! What caused a branch to activate, kept on the branch for audit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::SegmentId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ActivationContext {
    /// Activated by an operator
    Manual,
    /// Activated by the engine tick once every condition held
    Scheduled,
    /// Activated in response to a booked segment's result
    Segment {
        segment_id: SegmentId,
        summary: Option<String>,
    },
    /// Activated in response to some other external fact
    External { description: String },
}

impl Default for ActivationContext {
    fn default() -> Self {
        Self::Manual
    }
}

impl fmt::Display for ActivationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Segment {
                segment_id,
                summary: Some(summary),
            } => write!(f, "segment {} ({})", segment_id, summary),
            Self::Segment { segment_id, .. } => write!(f, "segment {}", segment_id),
            Self::External { description } => write!(f, "external: {}", description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(ActivationContext::Manual.to_string(), "manual");
        assert_eq!(ActivationContext::Scheduled.to_string(), "scheduled");
        let ext = ActivationContext::External {
            description: "PPV buyrate spike".into(),
        };
        assert_eq!(ext.to_string(), "external: PPV buyrate spike");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(ActivationContext::Manual).unwrap();
        assert_eq!(json["kind"], "manual");
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of one job's materials.
///
/// ```text
/// Initial → Generated → Scored → Validated → Refined → Rescored → Finalized
///    └──────────┴── hard generation failure ──→ Failed
/// any non-terminal state ── skip() ──→ Skipped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Initial,
    Generated,
    Scored,
    Validated,
    Refined,
    Rescored,
    Finalized,
    Failed,
    Skipped,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::Finalized | PipelineState::Failed | PipelineState::Skipped
        )
    }

    /// States that hold a bundle which may be thrown away and regenerated.
    pub fn can_regenerate(self) -> bool {
        matches!(
            self,
            PipelineState::Generated
                | PipelineState::Scored
                | PipelineState::Validated
                | PipelineState::Refined
                | PipelineState::Rescored
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Initial => "INITIAL",
            PipelineState::Generated => "GENERATED",
            PipelineState::Scored => "SCORED",
            PipelineState::Validated => "VALIDATED",
            PipelineState::Refined => "REFINED",
            PipelineState::Rescored => "RESCORED",
            PipelineState::Finalized => "FINALIZED",
            PipelineState::Failed => "FAILED",
            PipelineState::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a pipeline's transition history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub action: &'static str,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::Finalized.is_terminal());
        assert!(PipelineState::Failed.is_terminal());
        assert!(PipelineState::Skipped.is_terminal());
        assert!(!PipelineState::Rescored.is_terminal());
        assert!(!PipelineState::Initial.is_terminal());
    }

    #[test]
    fn test_regeneration_needs_a_bundle() {
        assert!(!PipelineState::Initial.can_regenerate());
        assert!(PipelineState::Validated.can_regenerate());
        assert!(!PipelineState::Finalized.can_regenerate());
    }

    #[test]
    fn test_display_and_serialize_agree() {
        assert_eq!(PipelineState::Rescored.to_string(), "RESCORED");
        assert_eq!(
            serde_json::to_value(PipelineState::Rescored).unwrap(),
            serde_json::json!("RESCORED")
        );
    }
}

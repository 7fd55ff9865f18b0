use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a build. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildState::Succeeded | BuildState::Failed | BuildState::Cancelled
        )
    }

    /// Pending may fail or be cancelled before the worker ever runs the tool.
    pub fn can_transition_to(self, next: BuildState) -> bool {
        use BuildState::*;
        matches!(
            (self, next),
            (Pending, Running | Failed | Cancelled) | (Running, Succeeded | Failed | Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildState::Pending => "pending",
            BuildState::Running => "running",
            BuildState::Succeeded => "succeeded",
            BuildState::Failed => "failed",
            BuildState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::BuildState::{self, *};
    use yare::parameterized;

    #[parameterized(
        start = { Pending, Running },
        spawn_failure = { Pending, Failed },
        cancel_while_queued = { Pending, Cancelled },
        success = { Running, Succeeded },
        failure = { Running, Failed },
        cancel_while_running = { Running, Cancelled },
    )]
    fn test_allowed_transitions(from: BuildState, to: BuildState) {
        assert!(from.can_transition_to(to));
    }

    #[parameterized(
        skip_running = { Pending, Succeeded },
        backwards = { Running, Pending },
        self_loop = { Running, Running },
        resurrect_cancelled = { Cancelled, Succeeded },
        refail = { Failed, Failed },
        after_success = { Succeeded, Cancelled },
    )]
    fn test_rejected_transitions(from: BuildState, to: BuildState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!Pending.is_terminal());
        assert!(!Running.is_terminal());
        assert!(Succeeded.is_terminal());
        assert!(Failed.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"cancelled\"");
        assert_eq!(Succeeded.to_string(), "succeeded");
    }
}

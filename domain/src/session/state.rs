//! Engine session lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the single engine session.
///
/// ```text
/// Idle --load--> Loading --(first output)--> Ready
/// Ready --send--> Generating --(boundary)--> Ready
/// any --unload / process exit / load timeout--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No engine process.
    #[default]
    Idle,
    /// Process started, no output seen yet.
    Loading,
    /// Process alive and waiting for a prompt.
    Ready,
    /// Prompt sent, waiting for the reply boundary.
    Generating,
}

impl SessionState {
    /// Whether an engine process is attached.
    pub fn is_live(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }

    /// Whether the state must be resolved by output, exit or a timeout.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionState::Loading | SessionState::Generating)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Generating => "generating",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
        assert!(!SessionState::Idle.is_live());
    }

    #[test]
    fn test_transient_states() {
        assert!(SessionState::Loading.is_transient());
        assert!(SessionState::Generating.is_transient());
        assert!(!SessionState::Ready.is_transient());
        assert!(!SessionState::Idle.is_transient());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Generating.to_string(), "generating");
    }
}

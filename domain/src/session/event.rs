//! Events the supervisor emits toward the surrounding application.
//!
//! Events are delivered in order. For one turn, every [`EngineEvent::RawChunk`]
//! precedes the matching [`EngineEvent::CompletedReply`].

use std::fmt;

/// Why an engine session ended without being unloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The process exited on its own or after an interrupt.
    Exited { code: Option<i32> },
    /// No output arrived before the load timeout.
    LoadTimedOut,
    /// The engine could not be started; nothing is running.
    LaunchFailed { reason: String },
}

impl fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEndReason::Exited { code: Some(code) } => {
                write!(f, "engine exited with code {}", code)
            }
            SessionEndReason::Exited { code: None } => write!(f, "engine terminated by signal"),
            SessionEndReason::LoadTimedOut => write!(f, "engine did not finish loading in time"),
            SessionEndReason::LaunchFailed { reason } => {
                write!(f, "engine failed to start: {}", reason)
            }
        }
    }
}

/// Notification produced by the engine supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A load began for the named model.
    LoadingStarted { model: String },
    /// First output observed after a load; the engine accepts prompts.
    LoadingFinished,
    /// The session was torn down by `load` or `unload`.
    Unloaded,
    /// An interrupt was sent to stop the current generation.
    InferenceStopped,
    /// Live partial output, in arrival order.
    RawChunk(String),
    /// Finalised output of one turn.
    CompletedReply(String),
    /// A line from the engine's diagnostic stream, forwarded verbatim.
    DiagnosticLine(String),
    /// The session ended outside of an `unload`.
    SessionEnded(SessionEndReason),
}

impl EngineEvent {
    /// Short name used in transcripts and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::LoadingStarted { .. } => "loading_started",
            EngineEvent::LoadingFinished => "loading_finished",
            EngineEvent::Unloaded => "unloaded",
            EngineEvent::InferenceStopped => "inference_stopped",
            EngineEvent::RawChunk(_) => "raw_chunk",
            EngineEvent::CompletedReply(_) => "completed_reply",
            EngineEvent::DiagnosticLine(_) => "diagnostic_line",
            EngineEvent::SessionEnded(_) => "session_ended",
        }
    }

    /// Returns the text payload of chunk, reply and diagnostic events.
    pub fn text(&self) -> Option<&str> {
        match self {
            EngineEvent::RawChunk(s)
            | EngineEvent::CompletedReply(s)
            | EngineEvent::DiagnosticLine(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payloads() {
        assert_eq!(EngineEvent::RawChunk("a".into()).text(), Some("a"));
        assert_eq!(EngineEvent::CompletedReply("b".into()).text(), Some("b"));
        assert_eq!(EngineEvent::LoadingFinished.text(), None);
    }

    #[test]
    fn test_end_reason_display() {
        assert_eq!(
            SessionEndReason::Exited { code: Some(1) }.to_string(),
            "engine exited with code 1"
        );
        assert_eq!(
            SessionEndReason::Exited { code: None }.to_string(),
            "engine terminated by signal"
        );
        assert_eq!(
            SessionEndReason::LaunchFailed {
                reason: "Engine executable not found: /opt/llama-cli".to_string()
            }
            .to_string(),
            "engine failed to start: Engine executable not found: /opt/llama-cli"
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EngineEvent::Unloaded.kind(), "unloaded");
        assert_eq!(
            EngineEvent::SessionEnded(SessionEndReason::LoadTimedOut).kind(),
            "session_ended"
        );
    }
}

//! Type definitions for the engine supervisor.

use crate::ports::engine_launcher::{EngineExit, LaunchError};
use localchat_domain::{EngineEvent, EngineVariant, LoadRequest, SessionState};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors returned synchronously by supervisor commands
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Model is still loading, wait for it to finish")]
    NotReady,

    #[error("No model loaded, load a model first")]
    NoSession,

    #[error("A reply is still being generated, wait for it or cancel")]
    TurnInProgress,

    #[error("Failed to launch engine: {0}")]
    Launch(#[from] LaunchError),

    #[error("Failed to write to engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("Supervisor stopped")]
    Stopped,
}

impl SupervisorError {
    /// Whether the caller can fix this by waiting or loading first.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SupervisorError::NotReady | SupervisorError::NoSession | SupervisorError::TurnInProgress
        )
    }
}

/// Outcome of a successful `load`.
///
/// Returned as soon as the process is started; readiness is signalled later
/// by [`EngineEvent::LoadingFinished`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    /// Model file name
    pub model: String,
    /// Engine build that was started
    pub variant: EngineVariant,
    /// Effective accelerator layer count
    pub gpu_layers: u32,
    /// Executable that was started
    pub executable: PathBuf,
    /// OS process id, when known
    pub pid: Option<u32>,
}

/// Receiving side of the supervisor's event stream.
///
/// Events arrive in emission order.
pub struct EngineEvents {
    receiver: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineEvents {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<EngineEvent>) -> Self {
        Self { receiver }
    }

    /// Wait for the next event. `None` once the supervisor has stopped.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Commands accepted by the supervisor task.
pub(super) enum Command {
    Load {
        request: LoadRequest,
        reply: oneshot::Sender<Result<LoadResult, SupervisorError>>,
    },
    Unload {
        reply: oneshot::Sender<()>,
    },
    Send {
        prompt: String,
        reply: oneshot::Sender<Result<(), SupervisorError>>,
    },
    Cancel {
        reply: oneshot::Sender<()>,
    },
    State {
        reply: oneshot::Sender<SessionState>,
    },
}

/// Notifications from an engine's I/O tasks, tagged with the session
/// generation they belong to.
#[derive(Debug)]
pub(super) enum EngineSignal {
    Output { generation: u64, bytes: Vec<u8> },
    Diagnostic { generation: u64, line: String },
    Exited { generation: u64, exit: EngineExit },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(SupervisorError::NotReady.is_recoverable());
        assert!(SupervisorError::NoSession.is_recoverable());
        assert!(SupervisorError::TurnInProgress.is_recoverable());
        assert!(!SupervisorError::Stopped.is_recoverable());
    }

    #[test]
    fn test_messages_are_instructive() {
        assert!(SupervisorError::NoSession.to_string().contains("load a model"));
        assert!(SupervisorError::NotReady.to_string().contains("loading"));
    }
}

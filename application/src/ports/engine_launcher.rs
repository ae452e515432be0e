//! Engine launcher port
//!
//! Defines how the supervisor starts an engine process and what it gets
//! back: three independent byte streams, a control handle for signals, and a
//! future that resolves when the process is gone.

use async_trait::async_trait;
use futures::future::BoxFuture;
use localchat_domain::{DomainError, LaunchPlan, LoadRequest};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

/// Writable end of the engine's standard input.
pub type EngineWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Readable end of the engine's standard output or standard error.
pub type EngineReader = Box<dyn AsyncRead + Send + Unpin>;

/// Errors that prevent an engine from starting
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{0}")]
    InvalidRequest(#[from] DomainError),

    #[error("Engine executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("Failed to start engine {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine started without a {0} pipe")]
    MissingPipe(&'static str),
}

impl LaunchError {
    /// Human-readable reason, suitable for showing next to a retry button.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// How an engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineExit {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

/// Signal delivery to a running engine.
///
/// Only the supervisor holds this handle.
pub trait EngineControl: Send + Sync {
    /// OS process id, when known.
    fn pid(&self) -> Option<u32>;

    /// Send an interrupt (SIGINT on unix, a hard kill elsewhere).
    fn interrupt(&self) -> std::io::Result<()>;

    /// Interrupt now and hard-kill if the process is still alive after `grace`.
    ///
    /// Returns immediately; the exit future reports when the process is gone.
    fn terminate(&self, grace: Duration);
}

/// A freshly started engine process.
pub struct SpawnedEngine {
    pub stdin: EngineWriter,
    pub stdout: EngineReader,
    pub stderr: EngineReader,
    pub control: Arc<dyn EngineControl>,
    /// Resolves once the process has exited and been reaped.
    pub exited: BoxFuture<'static, EngineExit>,
    /// Executable that was started.
    pub executable: PathBuf,
    /// Plan the process was started with.
    pub plan: LaunchPlan,
}

/// Port for starting engine processes.
///
/// Implementations resolve the executable for the plan's variant, validate
/// the request and spawn the process with three piped streams.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(
        &self,
        request: &LoadRequest,
        has_accelerator: bool,
    ) -> Result<SpawnedEngine, LaunchError>;
}

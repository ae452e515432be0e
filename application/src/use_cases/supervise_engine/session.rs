//! The single live engine session and its I/O tasks.
//!
//! An [`EngineSession`] owns the process input stream, the control handle and
//! the per-turn [`ReplyDecoder`]. Output, diagnostics and the exit
//! notification are read by background tasks and forwarded to the supervisor
//! task as [`EngineSignal`]s tagged with the session generation, so signals
//! from a session that was already torn down can be recognised and dropped.

use super::types::EngineSignal;
use crate::ports::engine_launcher::{
    EngineControl, EngineExit, EngineReader, EngineWriter, SpawnedEngine,
};
use futures::future::BoxFuture;
use localchat_domain::ReplyDecoder;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Read size for the engine's output stream.
const READ_CHUNK_SIZE: usize = 4096;

/// How long the exit watcher waits for the readers to drain after exit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

pub(super) struct EngineSession {
    pub(super) generation: u64,
    pub(super) model: String,
    pub(super) decoder: ReplyDecoder,
    stdin: EngineWriter,
    control: Arc<dyn EngineControl>,
    io_cancel: CancellationToken,
}

impl EngineSession {
    /// Take ownership of a spawned engine and start its I/O tasks.
    pub(super) fn attach(
        generation: u64,
        model: String,
        spawned: SpawnedEngine,
        signals: mpsc::UnboundedSender<EngineSignal>,
    ) -> Self {
        let SpawnedEngine {
            stdin,
            stdout,
            stderr,
            control,
            exited,
            ..
        } = spawned;

        let io_cancel = CancellationToken::new();

        let stdout_task = tokio::spawn(pump_output(
            generation,
            stdout,
            signals.clone(),
            io_cancel.clone(),
        ));
        let stderr_task = tokio::spawn(pump_diagnostics(
            generation,
            stderr,
            signals.clone(),
            io_cancel.clone(),
        ));
        tokio::spawn(watch_exit(
            generation,
            exited,
            [stdout_task, stderr_task],
            signals,
            io_cancel.clone(),
        ));

        Self {
            generation,
            model,
            decoder: ReplyDecoder::new(),
            stdin,
            control,
            io_cancel,
        }
    }

    pub(super) fn pid(&self) -> Option<u32> {
        self.control.pid()
    }

    /// Write one encoded prompt followed by the line terminator.
    pub(super) async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    pub(super) fn interrupt(&self) -> std::io::Result<()> {
        self.control.interrupt()
    }

    /// Stop the I/O tasks and ask the process to go away.
    ///
    /// Consumes the session: the input stream is dropped, which closes the
    /// engine's stdin.
    pub(super) fn terminate(self, grace: Duration) {
        debug!(
            "Terminating engine session {} (pid {:?})",
            self.generation,
            self.control.pid()
        );
        self.io_cancel.cancel();
        self.control.terminate(grace);
    }
}

async fn pump_output(
    generation: u64,
    mut stdout: EngineReader,
    signals: mpsc::UnboundedSender<EngineSignal>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = stdout.read(&mut buf) => match read {
                Ok(0) => {
                    debug!("Engine {} stdout closed", generation);
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("Engine {} stdout read failed: {}", generation, e);
                    break;
                }
            }
        };
        trace!("Engine {} stdout: {} bytes", generation, n);
        let signal = EngineSignal::Output {
            generation,
            bytes: buf[..n].to_vec(),
        };
        if signals.send(signal).is_err() {
            break;
        }
    }
}

async fn pump_diagnostics(
    generation: u64,
    stderr: EngineReader,
    signals: mpsc::UnboundedSender<EngineSignal>,
    cancel: CancellationToken,
) {
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();
    loop {
        line.clear();
        tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read_until(b'\n', &mut line) => match read {
                Ok(0) => {
                    debug!("Engine {} stderr closed", generation);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Engine {} stderr read failed: {}", generation, e);
                    break;
                }
            }
        }
        let text = String::from_utf8_lossy(&line);
        let signal = EngineSignal::Diagnostic {
            generation,
            line: text.trim_end_matches(['\r', '\n']).to_string(),
        };
        if signals.send(signal).is_err() {
            break;
        }
    }
}

/// Forward the exit once the readers have drained, so the last output of a
/// dying engine is delivered before the session ends.
async fn watch_exit(
    generation: u64,
    exited: BoxFuture<'static, EngineExit>,
    readers: [JoinHandle<()>; 2],
    signals: mpsc::UnboundedSender<EngineSignal>,
    cancel: CancellationToken,
) {
    let exit = tokio::select! {
        _ = cancel.cancelled() => return,
        exit = exited => exit,
    };
    debug!("Engine {} exited with {:?}", generation, exit.code);

    for reader in readers {
        if tokio::time::timeout(DRAIN_TIMEOUT, reader).await.is_err() {
            debug!("Engine {} reader still open after exit", generation);
        }
    }

    let _ = signals.send(EngineSignal::Exited { generation, exit });
}

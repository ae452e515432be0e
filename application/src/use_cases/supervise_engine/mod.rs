//! Supervise Engine use case - the session state machine.
//!
//! [`EngineSupervisor`] owns the one engine process the application may run
//! at a time. It is spawned as a single task that processes commands
//! (`load`, `unload`, `send`, `cancel`) strictly in order and reacts to engine
//! output as it arrives:
//!
//! ```text
//! Idle --load--> Loading --(first output)--> Ready
//! Ready --send--> Generating --(boundary detected)--> Ready
//! Ready/Generating --unload/process exit--> Idle
//! ```
//!
//! Every entry into Loading or Generating is resolved by output, process exit,
//! a failed launch or a timeout from [`SupervisorParams`]; the machine never
//! stalls, and leaving Loading always produces an event.
//!
//! Callers talk to it through a cloneable [`SupervisorHandle`] and observe it
//! through [`EngineEvents`].
//!
//! # Cancellation
//!
//! `cancel` interrupts the engine and emits
//! [`EngineEvent::InferenceStopped`] but keeps the session. If the engine goes
//! back to its prompt, the boundary moves Generating to Ready and the session
//! is reused; if it exits instead, the exit notification moves the machine to
//! Idle and emits [`EngineEvent::SessionEnded`].

mod session;
mod types;


pub use types::{EngineEvents, LoadResult, SupervisorError};

use crate::config::SupervisorParams;
use crate::ports::capability_probe::CapabilityProbe;
use crate::ports::engine_launcher::{EngineExit, EngineLauncher};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use localchat_domain::{EngineEvent, LoadRequest, SessionEndReason, SessionState, encode_prompt};
use session::EngineSession;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use types::{Command, EngineSignal};

/// Depth of the command queue between handles and the supervisor task.
const COMMAND_QUEUE_DEPTH: usize = 32;

/// Builder for the supervisor task.
pub struct EngineSupervisor {
    probe: Arc<dyn CapabilityProbe>,
    launcher: Arc<dyn EngineLauncher>,
    logger: Arc<dyn TranscriptLogger>,
    params: SupervisorParams,
}

impl EngineSupervisor {
    pub fn new(probe: Arc<dyn CapabilityProbe>, launcher: Arc<dyn EngineLauncher>) -> Self {
        Self {
            probe,
            launcher,
            logger: Arc::new(NoTranscriptLogger),
            params: SupervisorParams::default(),
        }
    }

    pub fn with_params(mut self, params: SupervisorParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn TranscriptLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Start the supervisor task on the current tokio runtime.
    pub fn spawn(self) -> (SupervisorHandle, EngineEvents) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let machine = StateMachine {
            probe: self.probe,
            launcher: self.launcher,
            logger: self.logger,
            params: self.params,
            events: event_tx,
            signals: signal_tx,
            state: SessionState::Idle,
            session: None,
            next_generation: 1,
            deadline: None,
        };
        tokio::spawn(machine.run(command_rx, signal_rx, shutdown.clone()));

        let handle = SupervisorHandle {
            commands: command_tx,
            shutdown,
        };
        (handle, EngineEvents::new(event_rx))
    }
}

/// Cloneable command interface to a running supervisor.
#[derive(Clone)]
pub struct SupervisorHandle {
    commands: mpsc::Sender<Command>,
    shutdown: CancellationToken,
}

impl SupervisorHandle {
    /// Replace any live engine with a new one for `request`.
    ///
    /// Resolves once the process is started. [`EngineEvent::LoadingFinished`]
    /// follows when the engine first produces output.
    pub async fn load(&self, request: LoadRequest) -> Result<LoadResult, SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(Command::Load { request, reply }).await?;
        rx.await.map_err(|_| SupervisorError::Stopped)?
    }

    /// Tear down the live engine, if any. Always emits [`EngineEvent::Unloaded`].
    pub async fn unload(&self) -> Result<(), SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(Command::Unload { reply }).await?;
        rx.await.map_err(|_| SupervisorError::Stopped)
    }

    /// Send one prompt. Multi-line text is encoded into a single line.
    pub async fn send(&self, prompt: impl Into<String>) -> Result<(), SupervisorError> {
        let (reply, rx) = oneshot::channel();
        let prompt = prompt.into();
        self.dispatch(Command::Send { prompt, reply }).await?;
        rx.await.map_err(|_| SupervisorError::Stopped)?
    }

    /// Interrupt the current generation.
    pub async fn cancel(&self) -> Result<(), SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(Command::Cancel { reply }).await?;
        rx.await.map_err(|_| SupervisorError::Stopped)
    }

    /// Current lifecycle state, after all earlier commands were processed.
    pub async fn state(&self) -> Result<SessionState, SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(Command::State { reply }).await?;
        rx.await.map_err(|_| SupervisorError::Stopped)
    }

    /// Stop the supervisor task, terminating any live engine.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn dispatch(&self, command: Command) -> Result<(), SupervisorError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SupervisorError::Stopped)
    }
}

/// State owned by the supervisor task. Nothing else touches the session.
struct StateMachine {
    probe: Arc<dyn CapabilityProbe>,
    launcher: Arc<dyn EngineLauncher>,
    logger: Arc<dyn TranscriptLogger>,
    params: SupervisorParams,
    events: mpsc::UnboundedSender<EngineEvent>,
    signals: mpsc::UnboundedSender<EngineSignal>,
    state: SessionState,
    session: Option<EngineSession>,
    next_generation: u64,
    /// Deadline resolving the current Loading or Generating state.
    deadline: Option<Instant>,
}

impl StateMachine {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut signals: mpsc::UnboundedReceiver<EngineSignal>,
        shutdown: CancellationToken,
    ) {
        debug!("Engine supervisor started");
        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(signal) = signals.recv() => self.handle_signal(signal),
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                _ = sleep_until(deadline) => self.handle_deadline(),
            }
        }

        if let Some(session) = self.session.take() {
            session.terminate(self.params.termination_grace);
        }
        debug!("Engine supervisor stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Load { request, reply } => {
                let result = self.load(request).await;
                let _ = reply.send(result);
            }
            Command::Unload { reply } => {
                self.unload();
                let _ = reply.send(());
            }
            Command::Send { prompt, reply } => {
                let result = self.send(prompt).await;
                let _ = reply.send(result);
            }
            Command::Cancel { reply } => {
                self.cancel();
                let _ = reply.send(());
            }
            Command::State { reply } => {
                let _ = reply.send(self.state);
            }
        }
    }

    // ==================== Commands ====================

    async fn load(&mut self, request: LoadRequest) -> Result<LoadResult, SupervisorError> {
        if self.teardown() {
            self.emit(EngineEvent::Unloaded);
        }

        let model = request.model_name();
        self.set_state(SessionState::Loading);
        self.emit(EngineEvent::LoadingStarted {
            model: model.clone(),
        });

        let has_accelerator = if request.use_accelerator {
            let found = self.probe.probe().await;
            debug!("Accelerator probe: {}", found);
            found
        } else {
            false
        };

        let spawned = match self.launcher.launch(&request, has_accelerator).await {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!("Engine launch failed: {}", e);
                self.set_state(SessionState::Idle);
                self.end_session(SessionEndReason::LaunchFailed {
                    reason: e.reason(),
                });
                return Err(e.into());
            }
        };

        let generation = self.next_generation;
        self.next_generation += 1;

        let result = LoadResult {
            model: model.clone(),
            variant: spawned.plan.variant,
            gpu_layers: spawned.plan.gpu_layers,
            executable: spawned.executable.clone(),
            pid: spawned.control.pid(),
        };

        info!(
            "Engine started: {} ({} variant, {} gpu layers, pid {:?})",
            model, result.variant, result.gpu_layers, result.pid
        );
        self.logger.log(TranscriptEvent::new(
            "engine_loaded",
            serde_json::json!({
                "model": model,
                "variant": result.variant.to_string(),
                "gpu_layers": result.gpu_layers,
                "executable": result.executable.display().to_string(),
                "args": spawned.plan.args,
            }),
        ));

        self.session = Some(EngineSession::attach(
            generation,
            model,
            spawned,
            self.signals.clone(),
        ));
        self.deadline = Some(Instant::now() + self.params.load_timeout);

        Ok(result)
    }

    fn unload(&mut self) {
        if self.teardown() {
            info!("Engine unloaded");
        } else {
            debug!("Unload requested with no live engine");
        }
        self.emit(EngineEvent::Unloaded);
    }

    async fn send(&mut self, prompt: String) -> Result<(), SupervisorError> {
        match self.state {
            SessionState::Idle => return Err(SupervisorError::NoSession),
            SessionState::Loading => return Err(SupervisorError::NotReady),
            SessionState::Generating => return Err(SupervisorError::TurnInProgress),
            SessionState::Ready => {}
        }
        let Some(session) = self.session.as_mut() else {
            return Err(SupervisorError::NoSession);
        };

        session.decoder.reset();
        let line = encode_prompt(&prompt);
        session.write_line(&line).await?;
        debug!("Prompt sent ({} bytes encoded)", line.len());

        self.logger.log(TranscriptEvent::new(
            "prompt_sent",
            serde_json::json!({
                "model": session.model,
                "prompt": prompt,
            }),
        ));

        self.set_state(SessionState::Generating);
        self.deadline = self.params.turn_timeout.map(|t| Instant::now() + t);
        Ok(())
    }

    fn cancel(&mut self) {
        let Some(session) = self.session.as_ref() else {
            debug!("Cancel requested with no live engine");
            return;
        };
        if let Err(e) = session.interrupt() {
            warn!("Failed to interrupt engine {:?}: {}", session.pid(), e);
        }
        info!("Inference interrupted");
        self.emit(EngineEvent::InferenceStopped);
    }

    // ==================== Engine signals ====================

    fn handle_signal(&mut self, signal: EngineSignal) {
        match signal {
            EngineSignal::Output { generation, bytes } => self.on_output(generation, &bytes),
            EngineSignal::Diagnostic { generation, line } => {
                if self.is_current(generation) {
                    self.emit(EngineEvent::DiagnosticLine(line));
                }
            }
            EngineSignal::Exited { generation, exit } => self.on_exit(generation, exit),
        }
    }

    fn on_output(&mut self, generation: u64, bytes: &[u8]) {
        if !self.is_current(generation) {
            trace!("Dropping {} bytes from stale engine {}", bytes.len(), generation);
            return;
        }

        if self.state == SessionState::Loading {
            info!("Engine produced first output, ready for prompts");
            self.set_state(SessionState::Ready);
            self.emit(EngineEvent::LoadingFinished);
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let decoded = session.decoder.feed(bytes);
        let model = session.model.clone();

        if !decoded.raw.is_empty() {
            self.emit(EngineEvent::RawChunk(decoded.raw));
        }

        if let Some(reply) = decoded.reply {
            if self.state == SessionState::Generating {
                debug!("Reply boundary detected ({} bytes)", reply.len());
                self.logger.log(TranscriptEvent::new(
                    "reply_completed",
                    serde_json::json!({
                        "model": model,
                        "reply": reply,
                    }),
                ));
                self.set_state(SessionState::Ready);
                self.emit(EngineEvent::CompletedReply(reply));
            } else {
                debug!(
                    "Prompt marker outside a turn, discarding {} bytes of output",
                    reply.len()
                );
            }
        }
    }

    fn on_exit(&mut self, generation: u64, exit: EngineExit) {
        if !self.is_current(generation) {
            trace!("Ignoring exit of stale engine {}", generation);
            return;
        }

        let reason = SessionEndReason::Exited { code: exit.code };
        if self.state == SessionState::Generating {
            warn!("Engine exited mid-turn: {}", reason);
        } else {
            info!("{}", reason);
        }

        // The process is gone; nothing left to terminate.
        self.session = None;
        self.set_state(SessionState::Idle);
        self.end_session(reason);
    }

    fn handle_deadline(&mut self) {
        self.deadline = None;
        match self.state {
            SessionState::Loading => {
                warn!(
                    "Engine did not produce output within {:?}, giving up",
                    self.params.load_timeout
                );
                self.teardown();
                self.end_session(SessionEndReason::LoadTimedOut);
            }
            SessionState::Generating => {
                warn!("Turn exceeded {:?}, interrupting", self.params.turn_timeout);
                self.cancel();
            }
            SessionState::Idle | SessionState::Ready => {}
        }
    }

    // ==================== Helpers ====================

    fn is_current(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    /// Terminate the live session, if any. Returns whether one existed.
    fn teardown(&mut self) -> bool {
        self.set_state(SessionState::Idle);
        match self.session.take() {
            Some(session) => {
                session.terminate(self.params.termination_grace);
                true
            }
            None => false,
        }
    }

    fn end_session(&mut self, reason: SessionEndReason) {
        self.logger.log(TranscriptEvent::new(
            "session_ended",
            serde_json::json!({ "reason": reason.to_string() }),
        ));
        if let SessionEndReason::Exited { .. } = reason {
            self.emit(EngineEvent::DiagnosticLine(reason.to_string()));
        }
        self.emit(EngineEvent::SessionEnded(reason));
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            trace!("Session state {} -> {}", self.state, state);
            self.state = state;
        }
        if !state.is_transient() {
            self.deadline = None;
        }
    }

    fn emit(&self, event: EngineEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.events.send(event);
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

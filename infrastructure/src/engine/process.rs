//! Engine processes started with `tokio::process`.
//!
//! [`ProcessEngineLauncher`] resolves the executable for the launch plan,
//! spawns it with three piped streams and hands the supervisor a
//! [`SpawnedEngine`]. The child itself is owned by an exit-watcher task that
//! reaps it and carries out hard-kill requests from [`ProcessControl`].

use async_trait::async_trait;
use futures::FutureExt;
use localchat_application::ports::engine_launcher::{
    EngineControl, EngineExit, EngineLauncher, LaunchError, SpawnedEngine,
};
use localchat_domain::{LaunchPlan, LoadRequest};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::layout::{RuntimeLayout, default_binary_name};

/// Launches `llama-cli` style engines from a [`RuntimeLayout`].
#[derive(Debug, Clone)]
pub struct ProcessEngineLauncher {
    layout: RuntimeLayout,
    binary: String,
}

impl ProcessEngineLauncher {
    pub fn new(layout: RuntimeLayout) -> Self {
        Self {
            layout,
            binary: default_binary_name().to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Executable and plan for a request, without starting anything.
    pub fn resolve(&self, request: &LoadRequest, has_accelerator: bool) -> (PathBuf, LaunchPlan) {
        let plan = LaunchPlan::resolve(request, has_accelerator);
        let executable = self.layout.executable(plan.variant, &self.binary);
        (executable, plan)
    }
}

#[async_trait]
impl EngineLauncher for ProcessEngineLauncher {
    async fn launch(
        &self,
        request: &LoadRequest,
        has_accelerator: bool,
    ) -> Result<SpawnedEngine, LaunchError> {
        request.validate()?;

        let (executable, plan) = self.resolve(request, has_accelerator);
        if !executable.is_file() {
            return Err(LaunchError::ExecutableNotFound(executable));
        }

        info!(
            "Spawning engine from {}: {}",
            executable.display(),
            plan.display_args()
        );

        let mut cmd = Command::new(&executable);
        cmd.args(&plan.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: have the kernel stop the engine if we die without cleaning up.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            path: executable.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or(LaunchError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(LaunchError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(LaunchError::MissingPipe("stderr"))?;

        let pid = child.id();
        let live_pid = Arc::new(Mutex::new(pid));
        let kill = CancellationToken::new();
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(reap(child, live_pid.clone(), kill.clone(), exit_tx));

        let exited = async move { exit_rx.await.unwrap_or(EngineExit { code: None }) }.boxed();

        debug!("Engine started with pid {:?}", pid);

        Ok(SpawnedEngine {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            control: Arc::new(ProcessControl {
                pid: live_pid,
                kill,
            }),
            exited,
            executable,
            plan,
        })
    }
}

/// Own the child until it exits, hard-killing it on request.
///
/// The shared pid is cleared as soon as the child is reaped, before the exit
/// is reported, so no signal can reach a recycled pid.
async fn reap(
    mut child: Child,
    pid: Arc<Mutex<Option<u32>>>,
    kill: CancellationToken,
    exit_tx: oneshot::Sender<EngineExit>,
) {
    let waited = tokio::select! {
        status = child.wait() => Some(status),
        _ = kill.cancelled() => None,
    };

    let status = match waited {
        Some(status) => status,
        None => {
            debug!("Hard-killing engine {:?}", child.id());
            if let Err(e) = child.start_kill() {
                debug!("Kill failed, engine probably already gone: {}", e);
            }
            child.wait().await
        }
    };

    lock_pid(&pid).take();

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!("Failed to wait for engine: {}", e);
            None
        }
    };
    let _ = exit_tx.send(EngineExit { code });
}

fn lock_pid(pid: &Mutex<Option<u32>>) -> MutexGuard<'_, Option<u32>> {
    pid.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Signal handle for a spawned engine process.
///
/// The pid is `None` once the reaper has collected the child.
pub struct ProcessControl {
    pid: Arc<Mutex<Option<u32>>>,
    kill: CancellationToken,
}

impl EngineControl for ProcessControl {
    fn pid(&self) -> Option<u32> {
        *lock_pid(&self.pid)
    }

    #[cfg(unix)]
    fn interrupt(&self) -> std::io::Result<()> {
        // Keep the guard until the signal is sent.
        let guard = lock_pid(&self.pid);
        let Some(pid) = *guard else {
            // Already reaped.
            return Ok(());
        };
        let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
        if result == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        Err(err)
    }

    #[cfg(not(unix))]
    fn interrupt(&self) -> std::io::Result<()> {
        self.kill.cancel();
        Ok(())
    }

    fn terminate(&self, grace: Duration) {
        if let Err(e) = self.interrupt() {
            debug!("Interrupt before termination failed: {}", e);
        }
        let kill = self.kill.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    kill.cancel();
                });
            }
            Err(_) => kill.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localchat_domain::EngineVariant;

    #[test]
    fn test_resolve_without_accelerator_uses_baseline() {
        let launcher = ProcessEngineLauncher::new(RuntimeLayout::rooted_at("/opt/localchat"))
            .with_binary("llama-cli");
        let request = LoadRequest::new("/m/x.gguf")
            .with_threads(4)
            .with_gpu_layers(0)
            .with_context_size(2048)
            .with_batch_size(512);

        let (executable, plan) = launcher.resolve(&request, false);

        assert_eq!(plan.variant, EngineVariant::Baseline);
        assert!(executable.components().any(|c| c.as_os_str() == "cpu"));
        assert_eq!(
            plan.args.join(" "),
            "-m /m/x.gguf --threads 4 --ctx-size 2048 --batch-size 512 --n-predict 2048 --n-gpu-layers 0"
        );
    }

    #[tokio::test]
    async fn test_missing_executable_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessEngineLauncher::new(RuntimeLayout::rooted_at(dir.path()));

        let err = match launcher.launch(&LoadRequest::new("/m/x.gguf"), false).await {
            Err(e) => e,
            Ok(_) => panic!("launch should fail without an executable"),
        };
        match err {
            LaunchError::ExecutableNotFound(path) => {
                assert!(path.starts_with(dir.path().join("runtimes").join("cpu")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_spawn() {
        let launcher = ProcessEngineLauncher::new(RuntimeLayout::rooted_at("/nonexistent"));
        let result = launcher
            .launch(&LoadRequest::new("/m/x.gguf").with_batch_size(0), false)
            .await;
        assert!(matches!(result, Err(LaunchError::InvalidRequest(_))));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

        /// Install a shell script as the baseline engine under `root`.
        fn install_engine(root: &std::path::Path, script: &str) {
            let dir = root.join("runtimes").join("cpu");
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join("llama-cli");
            std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn launcher(root: &std::path::Path) -> ProcessEngineLauncher {
            ProcessEngineLauncher::new(RuntimeLayout::rooted_at(root)).with_binary("llama-cli")
        }

        #[tokio::test]
        async fn test_spawned_engine_pipes_are_wired() {
            let dir = tempfile::tempdir().unwrap();
            install_engine(
                dir.path(),
                "echo loading >&2\nread line\necho \"got $line\"\nexit 3",
            );

            let mut engine = launcher(dir.path())
                .launch(&LoadRequest::new("/m/x.gguf"), false)
                .await
                .unwrap();
            assert!(engine.control.pid().is_some());

            let mut stderr = BufReader::new(engine.stderr);
            let mut line = String::new();
            stderr.read_line(&mut line).await.unwrap();
            assert_eq!(line, "loading\n");

            engine.stdin.write_all(b"hello\n").await.unwrap();
            engine.stdin.flush().await.unwrap();

            let mut out = String::new();
            engine.stdout.read_to_string(&mut out).await.unwrap();
            assert_eq!(out, "got hello\n");

            let exit = engine.exited.await;
            assert_eq!(exit.code, Some(3));
        }

        #[tokio::test]
        async fn test_terminate_escalates_to_kill() {
            let dir = tempfile::tempdir().unwrap();
            // Ignores SIGINT, so only the hard kill ends it.
            install_engine(dir.path(), "trap '' INT\nwhile true; do sleep 1; done");

            let engine = launcher(dir.path())
                .launch(&LoadRequest::new("/m/x.gguf"), false)
                .await
                .unwrap();

            engine.control.terminate(Duration::from_millis(100));
            let exit = tokio::time::timeout(Duration::from_secs(5), engine.exited)
                .await
                .expect("engine survived termination");
            assert_eq!(exit.code, None);
        }

        #[tokio::test]
        async fn test_reaped_engine_is_not_signalled() {
            let dir = tempfile::tempdir().unwrap();
            install_engine(dir.path(), "exit 0");

            let engine = launcher(dir.path())
                .launch(&LoadRequest::new("/m/x.gguf"), false)
                .await
                .unwrap();
            assert!(engine.control.pid().is_some());

            let exit = tokio::time::timeout(Duration::from_secs(5), engine.exited)
                .await
                .expect("engine did not exit");
            assert_eq!(exit.code, Some(0));

            assert_eq!(engine.control.pid(), None);
            engine.control.interrupt().unwrap();
            engine.control.terminate(Duration::from_millis(10));
        }

        #[tokio::test]
        async fn test_interrupt_delivers_sigint() {
            let dir = tempfile::tempdir().unwrap();
            install_engine(
                dir.path(),
                "trap 'exit 42' INT\necho ready\nwhile true; do sleep 0.1; done",
            );

            let engine = launcher(dir.path())
                .launch(&LoadRequest::new("/m/x.gguf"), false)
                .await
                .unwrap();

            let mut stdout = BufReader::new(engine.stdout);
            let mut line = String::new();
            stdout.read_line(&mut line).await.unwrap();
            assert_eq!(line, "ready\n");

            engine.control.interrupt().unwrap();
            let exit = tokio::time::timeout(Duration::from_secs(5), engine.exited)
                .await
                .expect("engine ignored SIGINT");
            assert_eq!(exit.code, Some(42));
        }
    }
}

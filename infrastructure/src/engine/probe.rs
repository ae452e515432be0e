//! Accelerator detection through `nvidia-smi`.

use async_trait::async_trait;
use localchat_application::ports::capability_probe::CapabilityProbe;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default probing command.
pub const DEFAULT_PROBE_COMMAND: &str = "nvidia-smi";

/// Default probing arguments: list GPU names, one per line.
pub const DEFAULT_PROBE_ARGS: [&str; 2] = ["--query-gpu=name", "--format=csv,noheader"];

/// Default upper bound for one probe run.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a query tool and reports an accelerator when it exits cleanly.
///
/// The tool's output is discarded; only the exit status matters. A missing
/// tool, a spawn failure, a non-zero exit or a timeout all count as "no
/// accelerator".
#[derive(Debug, Clone)]
pub struct NvidiaSmiProbe {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for NvidiaSmiProbe {
    fn default() -> Self {
        Self {
            command: DEFAULT_PROBE_COMMAND.to_string(),
            args: DEFAULT_PROBE_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl NvidiaSmiProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different query tool.
    pub fn with_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.command = command.into();
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CapabilityProbe for NvidiaSmiProbe {
    async fn probe(&self) -> bool {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!("Accelerator probe {} unavailable: {}", self.command, e);
                return false;
            }
        };

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Accelerator probe {} exited with {}", self.command, status);
                status.success()
            }
            Ok(Err(e)) => {
                debug!("Accelerator probe {} failed: {}", self.command, e);
                false
            }
            Err(_) => {
                debug!(
                    "Accelerator probe {} timed out after {:?}",
                    self.command, self.timeout
                );
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> NvidiaSmiProbe {
        NvidiaSmiProbe::new().with_command("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_clean_exit_means_accelerator() {
        assert!(shell("echo 'NVIDIA GeForce RTX 4090'").probe().await);
    }

    #[tokio::test]
    async fn test_nonzero_exit_means_none() {
        assert!(!shell("echo 'no devices' >&2; exit 9").probe().await);
    }

    #[tokio::test]
    async fn test_missing_tool_means_none() {
        let probe = NvidiaSmiProbe::new()
            .with_command("localchat-definitely-not-installed", Vec::new());
        assert!(!probe.probe().await);
    }

    #[tokio::test]
    async fn test_timeout_means_none() {
        let probe = shell("sleep 5").with_timeout(Duration::from_millis(100));
        assert!(!probe.probe().await);
    }
}

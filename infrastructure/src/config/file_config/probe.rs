//! Accelerator probe configuration from TOML (`[probe]` section)

use crate::engine::{DEFAULT_PROBE_ARGS, DEFAULT_PROBE_COMMAND, DEFAULT_PROBE_TIMEOUT, NvidiaSmiProbe};
use localchat_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProbeConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for FileProbeConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_PROBE_COMMAND.to_string(),
            args: DEFAULT_PROBE_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
        }
    }
}

impl FileProbeConfig {
    pub fn to_probe(&self) -> NvidiaSmiProbe {
        NvidiaSmiProbe::new()
            .with_command(self.command.clone(), self.args.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NonPositiveValue {
                    field: "probe.timeout_secs".to_string(),
                },
                "probe.timeout_secs: must be at least 1",
            ));
        }
        issues
    }
}

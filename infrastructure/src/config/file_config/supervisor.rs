//! Supervisor timing from TOML (`[supervisor]` section)

use localchat_application::SupervisorParams;
use localchat_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// # Example
///
/// ```toml
/// [supervisor]
/// load_timeout_secs = 600
/// turn_timeout_secs = 0          # 0 = wait for the engine indefinitely
/// termination_grace_secs = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSupervisorConfig {
    pub load_timeout_secs: u64,
    pub turn_timeout_secs: Option<u64>,
    pub termination_grace_secs: u64,
}

impl Default for FileSupervisorConfig {
    fn default() -> Self {
        let params = SupervisorParams::default();
        Self {
            load_timeout_secs: params.load_timeout.as_secs(),
            turn_timeout_secs: params.turn_timeout.map(|t| t.as_secs()),
            termination_grace_secs: params.termination_grace.as_secs(),
        }
    }
}

impl FileSupervisorConfig {
    pub fn to_params(&self) -> SupervisorParams {
        SupervisorParams::from_secs(
            self.load_timeout_secs,
            self.turn_timeout_secs,
            self.termination_grace_secs,
        )
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.load_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NonPositiveValue {
                    field: "supervisor.load_timeout_secs".to_string(),
                },
                "supervisor.load_timeout_secs: must be at least 1",
            ));
        }
        if self.termination_grace_secs > 60 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "supervisor.termination_grace_secs".to_string(),
                    value: i64::try_from(self.termination_grace_secs).unwrap_or(i64::MAX),
                },
                format!(
                    "supervisor.termination_grace_secs: {}s is a long time to wait for an engine to stop",
                    self.termination_grace_secs
                ),
            ));
        }
        issues
    }
}

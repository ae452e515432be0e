//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and application
//! types at the edges (`to_request`, `to_params`, `to_probe`).

mod engine;
mod load;
mod logging;
mod models;
mod probe;
mod supervisor;

pub use engine::FileEngineConfig;
pub use load::FileLoadConfig;
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use probe::FileProbeConfig;
pub use supervisor::FileSupervisorConfig;

use localchat_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Engine runtime location
    pub engine: FileEngineConfig,
    /// Model directory
    pub models: FileModelsConfig,
    /// Default load settings
    pub load: FileLoadConfig,
    /// Accelerator probe
    pub probe: FileProbeConfig,
    /// Supervisor timing
    pub supervisor: FileSupervisorConfig,
    /// Transcript and operation logs
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Errors make the configuration unusable; warnings are reported and
    /// the run continues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.load.validate());
        issues.extend(self.probe.validate());
        issues.extend(self.supervisor.validate());

        for (field, value) in [
            ("engine.runtime_dir", &self.engine.runtime_dir),
            ("models.directory", &self.models.directory),
        ] {
            if let Some(dir) = value
                && !expand_path(dir).is_dir()
            {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::MissingPath {
                        field: field.to_string(),
                        path: dir.clone(),
                    },
                    format!("{}: directory '{}' does not exist", field, dir),
                ));
            }
        }

        issues
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    Path::new(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use localchat_domain::Severity;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[engine]
binary_name = "llama-cli"

[models]
directory = "/srv/models"

[load]
threads = 8
gpu_layers = 20
ctx_size = 4096
batch_size = 256
flash_attn = true
use_gpu = true

[probe]
timeout_secs = 2

[supervisor]
load_timeout_secs = 60
turn_timeout_secs = 120

[logging]
transcript = "/tmp/localchat.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.binary(), "llama-cli");
        assert_eq!(config.models.directory.as_deref(), Some("/srv/models"));
        assert_eq!(config.load.threads, 8);
        assert!(config.load.use_gpu);
        assert_eq!(config.probe.command, "nvidia-smi");
        assert_eq!(config.probe.timeout_secs, 2);

        let params = config.supervisor.to_params();
        assert_eq!(params.load_timeout, Duration::from_secs(60));
        assert_eq!(params.turn_timeout, Some(Duration::from_secs(120)));
        assert_eq!(params.termination_grace, Duration::from_secs(3));

        let request = config.load.to_request("/srv/models/a.gguf");
        assert_eq!(request.thread_count, 8);
        assert_eq!(request.gpu_layer_count, 20);
        assert_eq!(request.context_size, 4096);
        assert_eq!(request.batch_size, 256);
        assert!(request.use_flash_attention);
        assert!(request.use_accelerator);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[load]
threads = 2
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.load.threads, 2);
        // Defaults should apply
        assert_eq!(config.load.ctx_size, 2048);
        assert_eq!(config.load.batch_size, 512);
        assert!(!config.load.use_gpu);
        assert_eq!(config.supervisor.load_timeout_secs, 300);
        assert!(config.logging.transcript.is_none());
    }

    #[test]
    fn test_validate_default_config() {
        assert!(FileConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_bad_load_values() {
        let mut config = FileConfig::default();
        config.load.threads = 0;
        config.load.batch_size = 0;
        config.load.gpu_layers = -1;
        config.probe.timeout_secs = 0;

        let issues = config.validate();
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::OutOfRange { field, value: -1 } if field == "load.gpu_layers"
        )));
    }

    #[test]
    fn test_validate_warns_on_missing_directory() {
        let mut config = FileConfig::default();
        config.models.directory = Some("/definitely/not/here".to_string());

        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
        assert!(matches!(
            &issues[0].code,
            ConfigIssueCode::MissingPath { field, .. } if field == "models.directory"
        ));
    }

    #[test]
    fn test_turn_timeout_zero_disables() {
        let config: FileConfig = toml::from_str("[supervisor]\nturn_timeout_secs = 0\n").unwrap();
        assert_eq!(config.supervisor.to_params().turn_timeout, None);
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/models"), home.join("models"));
        }
    }
}

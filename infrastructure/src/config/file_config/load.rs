//! Default load settings from TOML (`[load]` section)

use localchat_domain::{ConfigIssue, ConfigIssueCode, LoadRequest};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings applied to every model load unless overridden on the command line.
///
/// # Example
///
/// ```toml
/// [load]
/// threads = 8
/// gpu_layers = 0        # 0 offloads everything when a GPU is found
/// ctx_size = 4096
/// batch_size = 512
/// flash_attn = true
/// use_gpu = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoadConfig {
    pub threads: u32,
    pub gpu_layers: i32,
    pub ctx_size: u32,
    pub batch_size: u32,
    pub flash_attn: bool,
    pub use_gpu: bool,
}

impl Default for FileLoadConfig {
    fn default() -> Self {
        let defaults = LoadRequest::new("");
        Self {
            threads: defaults.thread_count,
            gpu_layers: defaults.gpu_layer_count,
            ctx_size: defaults.context_size,
            batch_size: defaults.batch_size,
            flash_attn: defaults.use_flash_attention,
            use_gpu: defaults.use_accelerator,
        }
    }
}

impl FileLoadConfig {
    pub fn to_request(&self, model_path: impl Into<PathBuf>) -> LoadRequest {
        LoadRequest::new(model_path)
            .with_threads(self.threads)
            .with_gpu_layers(self.gpu_layers)
            .with_context_size(self.ctx_size)
            .with_batch_size(self.batch_size)
            .with_flash_attention(self.flash_attn)
            .with_accelerator(self.use_gpu)
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, value) in [
            ("load.threads", self.threads),
            ("load.ctx_size", self.ctx_size),
            ("load.batch_size", self.batch_size),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::NonPositiveValue {
                        field: field.to_string(),
                    },
                    format!("{}: must be at least 1", field),
                ));
            }
        }
        if self.gpu_layers < 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "load.gpu_layers".to_string(),
                    value: i64::from(self.gpu_layers),
                },
                format!(
                    "load.gpu_layers: {} is negative, use 0 to offload all layers",
                    self.gpu_layers
                ),
            ));
        }
        issues
    }
}

//! Logging configuration from TOML (`[logging]` section)

use super::expand_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// # Example
///
/// ```toml
/// [logging]
/// transcript = "~/.local/share/localchat/transcript.jsonl"
/// log_dir = "~/.local/state/localchat"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of prompts, replies and engine lifecycle
    pub transcript: Option<String>,
    /// Directory for daily-rolling operation logs
    pub log_dir: Option<String>,
}

impl FileLoggingConfig {
    pub fn transcript_path(&self) -> Option<PathBuf> {
        self.transcript.as_deref().map(expand_path)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(expand_path)
    }
}

//! Model directory configuration from TOML (`[models]` section)

use super::expand_path;
use crate::engine::RuntimeLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// # Example
///
/// ```toml
/// [models]
/// directory = "~/models"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Directory scanned for model files; the bundled `models/` when unset
    pub directory: Option<String>,
}

impl FileModelsConfig {
    pub fn directory(&self, layout: &RuntimeLayout) -> PathBuf {
        match &self.directory {
            Some(dir) => expand_path(dir),
            None => layout.models_dir(),
        }
    }
}

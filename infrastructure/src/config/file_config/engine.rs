//! Engine runtime configuration from TOML (`[engine]` section)

use super::expand_path;
use crate::engine::{RuntimeLayout, default_binary_name};
use serde::{Deserialize, Serialize};

/// Where engine executables are found.
///
/// # Example
///
/// ```toml
/// [engine]
/// runtime_dir = "~/localchat"     # contains runtimes/gpu and runtimes/cpu
/// binary_name = "llama-cli"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Base directory holding `runtimes/`; detected when unset
    pub runtime_dir: Option<String>,
    /// Engine executable name; platform default when unset
    pub binary_name: Option<String>,
}

impl FileEngineConfig {
    pub fn layout(&self) -> RuntimeLayout {
        match &self.runtime_dir {
            Some(dir) => RuntimeLayout::rooted_at(expand_path(dir)),
            None => RuntimeLayout::detect(),
        }
    }

    pub fn binary(&self) -> String {
        self.binary_name
            .clone()
            .unwrap_or_else(|| default_binary_name().to_string())
    }
}

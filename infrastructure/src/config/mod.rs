//! Configuration file loading for localchat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `LOCALCHAT_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./localchat.toml` or `./.localchat.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/localchat/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileEngineConfig, FileLoadConfig, FileLoggingConfig, FileModelsConfig,
    FileProbeConfig, FileSupervisorConfig, expand_path,
};
pub use loader::ConfigLoader;

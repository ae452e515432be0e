//! Where engine runtimes and bundled models live on disk.
//!
//! During development everything sits under the project root. A packaged
//! install keeps native files outside the application archive, in
//! `resources/unpacked`, so they can be executed directly.

use localchat_domain::EngineVariant;
use std::path::{Path, PathBuf};

/// Directory inside `resources` that holds unpacked native files.
const UNPACKED_DIR: &str = "unpacked";

/// Engine executable name for this platform.
pub fn default_binary_name() -> &'static str {
    if cfg!(windows) {
        "llama-cli.exe"
    } else {
        "llama-cli"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeLayout {
    Development { root: PathBuf },
    Packaged { resources: PathBuf },
}

impl RuntimeLayout {
    /// Pick a layout for the running binary.
    ///
    /// Packaged when a `resources/unpacked` directory sits beside the current
    /// executable, otherwise development rooted at the working directory.
    pub fn detect() -> Self {
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            let resources = dir.join("resources");
            if resources.join(UNPACKED_DIR).is_dir() {
                return RuntimeLayout::Packaged { resources };
            }
        }
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        RuntimeLayout::Development { root }
    }

    /// Development layout rooted at an explicit directory.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        RuntimeLayout::Development {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory all bundled resources resolve against.
    pub fn base_dir(&self) -> PathBuf {
        match self {
            RuntimeLayout::Development { root } => root.clone(),
            RuntimeLayout::Packaged { resources } => resources.join(UNPACKED_DIR),
        }
    }

    /// `<base>/runtimes/<gpu|cpu>/<binary>`
    pub fn executable(&self, variant: EngineVariant, binary: &str) -> PathBuf {
        self.base_dir()
            .join("runtimes")
            .join(variant.dir_name())
            .join(binary)
    }

    /// Bundled models directory, used when none is configured.
    pub fn models_dir(&self) -> PathBuf {
        self.base_dir().join("models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_paths() {
        let layout = RuntimeLayout::rooted_at("/opt/localchat");
        assert_eq!(
            layout.executable(EngineVariant::Baseline, "llama-cli"),
            PathBuf::from("/opt/localchat/runtimes/cpu/llama-cli")
        );
        assert_eq!(
            layout.executable(EngineVariant::Accelerated, "llama-cli"),
            PathBuf::from("/opt/localchat/runtimes/gpu/llama-cli")
        );
        assert_eq!(layout.models_dir(), PathBuf::from("/opt/localchat/models"));
    }

    #[test]
    fn test_packaged_paths_go_through_unpacked() {
        let layout = RuntimeLayout::Packaged {
            resources: PathBuf::from("/app/resources"),
        };
        assert_eq!(
            layout.executable(EngineVariant::Accelerated, "llama-cli.exe"),
            PathBuf::from("/app/resources/unpacked/runtimes/gpu/llama-cli.exe")
        );
        assert_eq!(
            layout.models_dir(),
            PathBuf::from("/app/resources/unpacked/models")
        );
    }

    #[test]
    fn test_binary_name_matches_platform() {
        assert_eq!(default_binary_name().ends_with(".exe"), cfg!(windows));
    }
}

//! Load request value object
//!
//! A [`LoadRequest`] carries everything needed to start one engine process:
//! which model file to load and how the engine should be tuned. It is
//! immutable once handed to the supervisor.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of CPU threads handed to the engine.
pub const DEFAULT_THREADS: u32 = 4;
/// Default context window, in tokens.
pub const DEFAULT_CONTEXT_SIZE: u32 = 2048;
/// Default prompt-processing batch size.
pub const DEFAULT_BATCH_SIZE: u32 = 512;

/// Parameters for loading a model into a fresh engine process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Path to the model file
    pub model_path: PathBuf,
    /// Number of CPU threads
    pub thread_count: u32,
    /// Layers to offload onto the accelerator (0 = let the engine decide when accelerated)
    pub gpu_layer_count: i32,
    /// Context window size in tokens
    pub context_size: u32,
    /// Batch size for prompt processing
    pub batch_size: u32,
    /// Pass the flash-attention flag to the engine
    pub use_flash_attention: bool,
    /// Prefer the accelerated engine variant when hardware allows it
    pub use_accelerator: bool,
}

impl LoadRequest {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            thread_count: DEFAULT_THREADS,
            gpu_layer_count: 0,
            context_size: DEFAULT_CONTEXT_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            use_flash_attention: false,
            use_accelerator: false,
        }
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.thread_count = threads;
        self
    }

    pub fn with_gpu_layers(mut self, layers: i32) -> Self {
        self.gpu_layer_count = layers;
        self
    }

    pub fn with_context_size(mut self, size: u32) -> Self {
        self.context_size = size;
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_flash_attention(mut self, enabled: bool) -> Self {
        self.use_flash_attention = enabled;
        self
    }

    pub fn with_accelerator(mut self, enabled: bool) -> Self {
        self.use_accelerator = enabled;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// File name of the model, used for display and load results.
    ///
    /// Falls back to the full path when it has no final component.
    pub fn model_name(&self) -> String {
        self.model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model_path.to_string_lossy().into_owned())
    }

    /// Check the request before anything is spawned.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(DomainError::InvalidModelPath(
                "model path must not be empty".to_string(),
            ));
        }
        if self.thread_count == 0 {
            return Err(DomainError::InvalidLoadRequest(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.gpu_layer_count < 0 {
            return Err(DomainError::InvalidLoadRequest(format!(
                "gpu layer count must not be negative (got {})",
                self.gpu_layer_count
            )));
        }
        if self.batch_size == 0 {
            return Err(DomainError::InvalidLoadRequest(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

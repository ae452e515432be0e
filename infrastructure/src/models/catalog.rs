//! Model files available in a directory.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions recognised as model weights or model metadata.
pub const MODEL_EXTENSIONS: &[&str] = &[
    "gguf",
    "pt",
    "pth",
    "ckpt",
    "bin",
    "json",
    "safetensors",
    "onnx",
    "pb",
    "h5",
    "tflite",
    "msgpack",
    "npz",
    "pkl",
];

/// Whether `file_name` ends with a recognised model extension, ignoring case.
pub fn is_model_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MODEL_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Sorted file names of the model files directly inside `dir`.
///
/// A missing or unreadable directory yields an empty list.
pub fn list_available_models(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Models directory {} does not exist", dir.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Could not read models directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut models: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_model_file(name))
        .collect();
    models.sort();
    models
}

/// Path of a model chosen by name. Absolute or relative paths with a
/// directory component are taken as given.
pub fn resolve_model(dir: &Path, model: &str) -> PathBuf {
    let candidate = Path::new(model);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        candidate.to_path_buf()
    } else {
        dir.join(model)
    }
}

//! Model discovery on disk.

mod catalog;

pub use catalog::{MODEL_EXTENSIONS, is_model_file, list_available_models, resolve_model};

//! Infrastructure layer for localchat
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the accelerator probe, the engine process launcher,
//! the JSONL transcript logger. It also owns configuration file loading and
//! model discovery.

pub mod config;
pub mod engine;
pub mod logging;
pub mod models;

pub use config::{ConfigLoader, FileConfig};
pub use engine::{NvidiaSmiProbe, ProcessEngineLauncher, RuntimeLayout};
pub use logging::JsonlTranscriptLogger;
pub use models::{list_available_models, resolve_model};

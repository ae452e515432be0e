//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod capability_probe;
pub mod engine_launcher;
pub mod transcript_logger;

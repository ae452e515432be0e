//! Application layer for localchat
//!
//! This crate contains the engine supervisor use case, the ports it drives,
//! and its timing configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::SupervisorParams;
pub use ports::{
    capability_probe::{CapabilityProbe, FixedProbe},
    engine_launcher::{
        EngineControl, EngineExit, EngineLauncher, EngineReader, EngineWriter, LaunchError,
        SpawnedEngine,
    },
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use use_cases::supervise_engine::{
    EngineEvents, EngineSupervisor, LoadResult, SupervisorError, SupervisorHandle,
};

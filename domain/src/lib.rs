//! Domain layer for localchat
//!
//! This crate contains the core types and pure logic of the engine
//! supervisor. It performs no I/O and has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Engine
//!
//! The engine is an external, pre-built inference executable. A
//! [`LoadRequest`] describes what to run; [`LaunchPlan`] resolves it into an
//! [`EngineVariant`] and a fixed argument vector.
//!
//! ## Turn protocol
//!
//! Prompts go in as single lines ([`encode_prompt`]); replies come back as
//! unframed text, cut at the interactive-prompt marker
//! ([`find_reply_boundary`], [`ReplyDecoder`]).

pub mod config;
pub mod core;
pub mod engine;
pub mod protocol;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use core::error::DomainError;
pub use engine::{
    launch_plan::{LaunchPlan, MAX_OFFLOAD_LAYERS, effective_gpu_layers},
    load_request::LoadRequest,
    variant::EngineVariant,
};
pub use protocol::{
    codec::{BOUNDARY_MARKER, ESCAPED_LINE_BREAK, encode_prompt, find_reply_boundary},
    decoder::{DecodedChunk, ReplyDecoder},
};
pub use session::{
    event::{EngineEvent, SessionEndReason},
    state::SessionState,
};

//! Engine process adapters
//!
//! - [`NvidiaSmiProbe`] - accelerator detection ([`CapabilityProbe`](localchat_application::CapabilityProbe))
//! - [`ProcessEngineLauncher`] - child process engines ([`EngineLauncher`](localchat_application::EngineLauncher))
//! - [`RuntimeLayout`] - where engine executables and bundled models live

mod layout;
mod probe;
mod process;

pub use layout::{RuntimeLayout, default_binary_name};
pub use probe::{DEFAULT_PROBE_ARGS, DEFAULT_PROBE_COMMAND, DEFAULT_PROBE_TIMEOUT, NvidiaSmiProbe};
pub use process::{ProcessControl, ProcessEngineLauncher};

//! Application-level configuration.
//!
//! - [`SupervisorParams`] - engine lifecycle timing (load timeout, turn timeout, kill grace)

pub mod supervisor_params;

pub use supervisor_params::SupervisorParams;

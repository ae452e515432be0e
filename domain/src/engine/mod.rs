//! Engine launch domain.
//!
//! - [`load_request::LoadRequest`] - what to load and how to tune the engine
//! - [`variant::EngineVariant`] - accelerated vs baseline executable
//! - [`launch_plan::LaunchPlan`] - resolved variant, layer offload and arguments

pub mod launch_plan;
pub mod load_request;
pub mod variant;

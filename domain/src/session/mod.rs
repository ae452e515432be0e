//! Engine session domain.
//!
//! - [`state::SessionState`] - idle / loading / ready / generating
//! - [`event::EngineEvent`] - notifications toward the application

pub mod event;
pub mod state;

//! Presentation layer for localchat
//!
//! This crate contains the CLI definition, the interactive chat loop and the
//! terminal rendering of engine events.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatRepl, ModelCatalog};
pub use cli::commands::Cli;
pub use output::presenter::EventPresenter;

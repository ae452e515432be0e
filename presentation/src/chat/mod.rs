//! Interactive chat mode

mod command;
mod repl;

pub use command::{PromptBuffer, ReplCommand};
pub use repl::{ChatRepl, ModelCatalog, error_hint};

//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::{PromptBuffer, ReplCommand};
use colored::Colorize;
use localchat_application::{SupervisorError, SupervisorHandle};
use localchat_domain::LoadRequest;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Where the chat loop finds models and how it turns a name into a request.
pub trait ModelCatalog: Send + Sync {
    /// Model file names available for `/load`.
    fn list(&self) -> Vec<String>;

    /// Load request for a model name, with configured defaults applied.
    fn request_for(&self, model: &str) -> LoadRequest;

    /// Human-readable location of the models, for messages.
    fn location(&self) -> String;
}

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    handle: SupervisorHandle,
    catalog: Arc<dyn ModelCatalog>,
    current_model: Option<String>,
}

impl ChatRepl {
    pub fn new(handle: SupervisorHandle, catalog: Arc<dyn ModelCatalog>) -> Self {
        Self {
            handle,
            catalog,
            current_model: None,
        }
    }

    /// Model to load before the first prompt.
    pub fn with_initial_model(mut self, model: Option<String>) -> Self {
        self.current_model = model;
        self
    }

    /// Run the interactive REPL until `/quit` or end of input.
    pub async fn run(mut self) -> std::io::Result<()> {
        self.print_welcome();

        if let Some(model) = self.current_model.clone()
            && self.load(&model).await == Flow::Quit
        {
            return Ok(());
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut buffer = PromptBuffer::new();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        println!("Bye!");
                        break;
                    };
                    if self.handle_line(&mut buffer, &line).await == Flow::Quit {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    buffer.clear();
                    println!("^C");
                    if self.handle.cancel().await.is_err() {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_line(&mut self, buffer: &mut PromptBuffer, line: &str) -> Flow {
        if !buffer.is_continuing()
            && let Some(command) = ReplCommand::parse(line)
        {
            return self.handle_command(command).await;
        }

        let Some(prompt) = buffer.push_line(line) else {
            return Flow::Continue;
        };
        if prompt.trim().is_empty() {
            return Flow::Continue;
        }

        match self.handle.send(prompt).await {
            Ok(()) => Flow::Continue,
            Err(e) => report(&e),
        }
    }

    async fn handle_command(&mut self, command: ReplCommand) -> Flow {
        debug!("REPL command: {:?}", command);
        match command {
            ReplCommand::Load(name) => match name.or_else(|| self.current_model.clone()) {
                Some(model) => self.load(&model).await,
                None => {
                    println!("Usage: /load <model>   (see /models)");
                    Flow::Continue
                }
            },
            ReplCommand::Unload => match self.handle.unload().await {
                Ok(()) => Flow::Continue,
                Err(e) => report(&e),
            },
            ReplCommand::Cancel => match self.handle.cancel().await {
                Ok(()) => Flow::Continue,
                Err(e) => report(&e),
            },
            ReplCommand::Models => {
                self.print_models();
                Flow::Continue
            }
            ReplCommand::State => match self.handle.state().await {
                Ok(state) => {
                    let model = self.current_model.as_deref().unwrap_or("-");
                    println!("State: {}  Model: {}", state.to_string().bold(), model);
                    Flow::Continue
                }
                Err(e) => report(&e),
            },
            ReplCommand::Help => {
                print_help();
                Flow::Continue
            }
            ReplCommand::Quit => {
                println!("Bye!");
                Flow::Quit
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                Flow::Continue
            }
        }
    }

    async fn load(&mut self, model: &str) -> Flow {
        let request = self.catalog.request_for(model);
        match self.handle.load(request).await {
            Ok(result) => {
                self.current_model = Some(model.to_string());
                println!(
                    "{}",
                    format!(
                        "Started {} ({} build, {} GPU layers)",
                        result.executable.display(),
                        result.variant,
                        result.gpu_layers
                    )
                    .dimmed()
                );
                Flow::Continue
            }
            Err(e) => report(&e),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              localchat - Chat               │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Models: {}", self.catalog.location());
        println!("End a line with \\ to continue the prompt on the next line.");
        println!("Type /help for commands.");
        println!();
    }

    fn print_models(&self) {
        let models = self.catalog.list();
        println!();
        if models.is_empty() {
            println!("No models found in {}", self.catalog.location());
        } else {
            println!("Models in {}:", self.catalog.location());
            for model in models {
                if self.current_model.as_deref() == Some(model.as_str()) {
                    println!("  * {}", model.green());
                } else {
                    println!("  - {}", model);
                }
            }
        }
        println!();
    }
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  /load [model]    - Load a model (reloads the current one without a name)");
    println!("  /unload          - Stop the engine");
    println!("  /cancel          - Interrupt the reply being generated (also Ctrl-C)");
    println!("  /models          - List available models");
    println!("  /state           - Show the engine state");
    println!("  /help, /h, /?    - Show this help");
    println!("  /quit, /exit, /q - Exit chat");
    println!();
}

/// Print a rejected command and decide whether the loop can go on.
fn report(err: &SupervisorError) -> Flow {
    eprintln!("{}", error_hint(err).red());
    match err {
        SupervisorError::Stopped => Flow::Quit,
        _ => Flow::Continue,
    }
}

/// Instructive message for a rejected command.
pub fn error_hint(err: &SupervisorError) -> String {
    match err {
        SupervisorError::NotReady => "Model still loading, wait for \"Model ready\"".to_string(),
        SupervisorError::NoSession => "No model loaded, use /load <model>".to_string(),
        SupervisorError::TurnInProgress => {
            "Still generating, wait for the reply or /cancel".to_string()
        }
        other => format!("Error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_hints_are_instructive() {
        assert!(error_hint(&SupervisorError::NotReady).contains("still loading"));
        assert!(error_hint(&SupervisorError::NoSession).contains("/load"));
        assert!(error_hint(&SupervisorError::TurnInProgress).contains("/cancel"));
        assert_eq!(
            error_hint(&SupervisorError::Stopped),
            "Error: Supervisor stopped"
        );
    }

    #[test]
    fn test_stopped_supervisor_ends_the_loop() {
        assert_eq!(report(&SupervisorError::Stopped), Flow::Quit);
        assert_eq!(report(&SupervisorError::NoSession), Flow::Continue);
    }
}

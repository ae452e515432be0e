//! Terminal rendering of supervisor events

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use localchat_application::EngineEvents;
use localchat_domain::{EngineEvent, SessionEndReason};
use std::io::Write;
use std::time::Duration;

/// Renders [`EngineEvent`]s to the terminal.
///
/// In streaming mode engine output is printed as it arrives and a completed
/// reply only closes the line. In quiet mode nothing is streamed and each
/// completed reply is printed whole.
pub struct EventPresenter {
    stream: bool,
    show_diagnostics: bool,
    spinner: Option<ProgressBar>,
}

impl EventPresenter {
    pub fn new() -> Self {
        Self {
            stream: true,
            show_diagnostics: false,
            spinner: None,
        }
    }

    /// Stream raw engine output (default) or print whole replies only.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Show the engine's diagnostic stream, dimmed.
    pub fn with_diagnostics(mut self, show: bool) -> Self {
        self.show_diagnostics = show;
        self
    }

    /// Render events until the supervisor stops.
    pub async fn run(mut self, mut events: EngineEvents) {
        while let Some(event) = events.recv().await {
            self.handle(&event);
        }
        self.clear_spinner();
    }

    pub fn handle(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::LoadingStarted { model } => {
                self.clear_spinner();
                if self.stream {
                    self.spinner = Some(Self::loading_spinner(model));
                } else {
                    println!("{}", Self::status_line(event));
                }
            }
            EngineEvent::LoadingFinished => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.finish_and_clear();
                }
                println!("{}", Self::status_line(event));
            }
            EngineEvent::RawChunk(text) => {
                if self.stream {
                    self.suspend(|| {
                        print!("{}", text);
                        let _ = std::io::stdout().flush();
                    });
                }
            }
            EngineEvent::CompletedReply(reply) => {
                if self.stream {
                    println!();
                } else {
                    println!("{}\n", reply);
                }
            }
            EngineEvent::DiagnosticLine(line) => {
                if self.show_diagnostics {
                    self.suspend(|| eprintln!("{}", line.dimmed()));
                }
            }
            EngineEvent::Unloaded
            | EngineEvent::InferenceStopped
            | EngineEvent::SessionEnded(_) => {
                self.clear_spinner();
                println!("{}", Self::status_line(event));
            }
        }
    }

    /// One-line status text for lifecycle events.
    pub fn status_line(event: &EngineEvent) -> String {
        match event {
            EngineEvent::LoadingStarted { model } => {
                format!("{} {}", "Loading".cyan().bold(), model)
            }
            EngineEvent::LoadingFinished => format!("{}", "Model ready".green().bold()),
            EngineEvent::Unloaded => format!("{}", "Model unloaded".yellow()),
            EngineEvent::InferenceStopped => format!("\n{}", "Inference stopped".yellow()),
            EngineEvent::SessionEnded(SessionEndReason::Exited { code: Some(0) }) => {
                format!("{}", "Engine stopped".yellow())
            }
            EngineEvent::SessionEnded(reason) => {
                format!("{} {}", "Session ended:".red().bold(), reason)
            }
            EngineEvent::RawChunk(text)
            | EngineEvent::CompletedReply(text)
            | EngineEvent::DiagnosticLine(text) => text.clone(),
        }
    }

    fn loading_spinner(model: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Loading {}...", model));
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn suspend(&self, f: impl FnOnce()) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(f),
            None => f(),
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Default for EventPresenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(event: &EngineEvent) -> String {
        colored::control::set_override(false);
        EventPresenter::status_line(event)
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            plain(&EngineEvent::LoadingStarted {
                model: "tiny.gguf".to_string()
            }),
            "Loading tiny.gguf"
        );
        assert_eq!(plain(&EngineEvent::LoadingFinished), "Model ready");
        assert_eq!(
            plain(&EngineEvent::SessionEnded(SessionEndReason::Exited {
                code: Some(139)
            })),
            "Session ended: engine exited with code 139"
        );
        assert_eq!(
            plain(&EngineEvent::SessionEnded(SessionEndReason::Exited {
                code: Some(0)
            })),
            "Engine stopped"
        );
    }

    #[test]
    fn test_failed_launch_clears_loading_spinner() {
        let mut presenter = EventPresenter::new();
        presenter.handle(&EngineEvent::LoadingStarted {
            model: "tiny.gguf".to_string(),
        });
        assert!(presenter.spinner.is_some());

        let failed = EngineEvent::SessionEnded(SessionEndReason::LaunchFailed {
            reason: "Engine executable not found: /opt/llama-cli".to_string(),
        });
        presenter.handle(&failed);
        assert!(presenter.spinner.is_none());
        assert_eq!(
            plain(&failed),
            "Session ended: engine failed to start: Engine executable not found: /opt/llama-cli"
        );
    }

    #[test]
    fn test_quiet_presenter_handles_full_sequence() {
        let mut presenter = EventPresenter::new().with_stream(false);
        for event in [
            EngineEvent::LoadingStarted {
                model: "tiny.gguf".to_string(),
            },
            EngineEvent::LoadingFinished,
            EngineEvent::RawChunk("hi\n> ".to_string()),
            EngineEvent::CompletedReply("hi".to_string()),
            EngineEvent::DiagnosticLine("llama_print_timings".to_string()),
            EngineEvent::Unloaded,
        ] {
            presenter.handle(&event);
        }
        assert!(presenter.spinner.is_none());
    }
}

//! CLI entrypoint for localchat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use localchat_application::EngineSupervisor;
use localchat_domain::LoadRequest;
use localchat_infrastructure::{
    ConfigLoader, JsonlTranscriptLogger, ProcessEngineLauncher, list_available_models,
    resolve_model,
};
use localchat_presentation::{ChatRepl, Cli, EventPresenter, ModelCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Models directory plus the load settings every request starts from.
struct DirectoryCatalog {
    dir: PathBuf,
    template: LoadRequest,
}

impl ModelCatalog for DirectoryCatalog {
    fn list(&self) -> Vec<String> {
        list_available_models(&self.dir)
    }

    fn request_for(&self, model: &str) -> LoadRequest {
        LoadRequest {
            model_path: resolve_model(&self.dir, model),
            ..self.template.clone()
        }
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Initialize logging based on verbosity level, optionally mirrored to a
/// daily-rolling file.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "localchat.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_tracing(cli.verbose, config.logging.log_dir().as_deref())?;
    info!("Starting localchat");

    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            error!("{}", issue.message);
        } else {
            warn!("{}", issue.message);
        }
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Invalid configuration, see errors above");
    }

    let layout = config.engine.layout();
    let models_dir = cli
        .models_dir
        .clone()
        .unwrap_or_else(|| config.models.directory(&layout));

    if cli.list_models {
        let models = list_available_models(&models_dir);
        if models.is_empty() {
            eprintln!("No models found in {}", models_dir.display());
        }
        for model in models {
            println!("{}", model);
        }
        return Ok(());
    }

    // === Dependency Injection ===
    let catalog = Arc::new(DirectoryCatalog {
        dir: models_dir,
        template: cli.apply_overrides(config.load.to_request(PathBuf::new())),
    });

    let probe = Arc::new(config.probe.to_probe());
    let launcher =
        Arc::new(ProcessEngineLauncher::new(layout).with_binary(config.engine.binary()));

    let mut supervisor =
        EngineSupervisor::new(probe, launcher).with_params(config.supervisor.to_params());
    if let Some(path) = config.logging.transcript_path()
        && let Some(logger) = JsonlTranscriptLogger::new(&path)
    {
        info!("Writing transcript to {}", logger.path().display());
        supervisor = supervisor.with_logger(Arc::new(logger));
    }
    let (handle, events) = supervisor.spawn();

    let presenter = EventPresenter::new()
        .with_stream(!cli.quiet)
        .with_diagnostics(cli.verbose > 0);
    let presenter_task = tokio::spawn(presenter.run(events));

    let result = ChatRepl::new(handle.clone(), catalog)
        .with_initial_model(cli.model.clone())
        .run()
        .await;

    handle.shutdown();
    let _ = tokio::time::timeout(Duration::from_secs(1), presenter_task).await;

    result?;
    Ok(())
}

//! CLI command definitions

use clap::Parser;
use localchat_domain::LoadRequest;
use std::path::PathBuf;

/// CLI arguments for localchat
#[derive(Parser, Debug)]
#[command(name = "localchat")]
#[command(author, version, about = "Chat with a local model through llama-cli")]
#[command(long_about = r#"
localchat runs a local llama-cli engine and lets you chat with it.

The engine is started with the model you pick; the GPU build is used when
--gpu is given and an NVIDIA GPU is detected, otherwise the CPU build.

Configuration files are loaded from (in priority order):
1. LOCALCHAT_* environment variables
2. --config <path>       Explicit config file
3. ./localchat.toml      Project-level config
4. ~/.config/localchat/config.toml   Global config

Example:
  localchat --list-models
  localchat mistral-7b-instruct.Q4_K_M.gguf --gpu --ctx-size 4096
  localchat --models-dir ~/models tinyllama.gguf -v
"#)]
pub struct Cli {
    /// Model file to load at startup (a name inside the models directory, or a path)
    pub model: Option<String>,

    /// Directory containing model files
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// CPU threads for inference
    #[arg(short, long, value_name = "N")]
    pub threads: Option<u32>,

    /// Layers to offload to the GPU (0 = all, when a GPU is used)
    #[arg(long, value_name = "N")]
    pub gpu_layers: Option<i32>,

    /// Context window size in tokens
    #[arg(long, value_name = "N")]
    pub ctx_size: Option<u32>,

    /// Prompt processing batch size
    #[arg(long, value_name = "N")]
    pub batch_size: Option<u32>,

    /// Enable flash attention
    #[arg(long)]
    pub flash_attn: bool,

    /// Use the GPU build when an accelerator is detected
    #[arg(long)]
    pub gpu: bool,

    /// List models in the models directory and exit
    #[arg(long)]
    pub list_models: bool,

    /// Verbosity level (-v = info + engine diagnostics, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the live token stream and spinners; print whole replies
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a configured request.
    ///
    /// Flags only ever switch features on; numeric options replace the
    /// configured value when given.
    pub fn apply_overrides(&self, mut request: LoadRequest) -> LoadRequest {
        if let Some(threads) = self.threads {
            request = request.with_threads(threads);
        }
        if let Some(layers) = self.gpu_layers {
            request = request.with_gpu_layers(layers);
        }
        if let Some(ctx) = self.ctx_size {
            request = request.with_context_size(ctx);
        }
        if let Some(batch) = self.batch_size {
            request = request.with_batch_size(batch);
        }
        if self.flash_attn {
            request = request.with_flash_attention(true);
        }
        if self.gpu {
            request = request.with_accelerator(true);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_replace_given_values_only() {
        let cli = Cli::parse_from([
            "localchat",
            "tiny.gguf",
            "--threads",
            "8",
            "--gpu",
            "--ctx-size",
            "4096",
        ]);
        assert_eq!(cli.model.as_deref(), Some("tiny.gguf"));

        let base = LoadRequest::new("/models/tiny.gguf").with_batch_size(256);
        let request = cli.apply_overrides(base);

        assert_eq!(request.thread_count, 8);
        assert_eq!(request.context_size, 4096);
        assert_eq!(request.batch_size, 256);
        assert!(request.use_accelerator);
        assert!(!request.use_flash_attention);
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::parse_from(["localchat", "-vv", "--list-models"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.list_models);
        assert!(cli.model.is_none());
    }
}

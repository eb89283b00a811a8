//! Binary entry point that loads the environment, installs logging and
//! launches the MasterBot terminal loop.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use masterbot::config::DEFAULT_CONFIG_PATH;
use masterbot::session::{Mode, OutputMode};
use masterbot::terminal::{self, RunOptions};

/// MasterBot: chat, PDF questions and a voice assistant in your terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Initial mode: chat, pdf or voice.
    #[arg(long, default_value = "chat")]
    mode: Mode,

    /// Initial output mode: text, voice or both.
    #[arg(long, default_value = "both")]
    output: OutputMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("masterbot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    terminal::run(RunOptions {
        config_path: cli.config,
        mode: cli.mode,
        output_mode: cli.output,
    })
    .await
}

//! House Price Predictor - Main Entry Point

use anyhow::Context;
use api::config::AppConfig;
use api::telemetry::{init_logging, install_recorder};
use api::{run_server, terminal, AppState};
use clap::{Parser, Subcommand};
use inference_engine::InferenceEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "house-price")]
#[command(version)]
#[command(about = "Sri Lanka house price predictor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Listen address, overrides the config file
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Ask for one listing on the terminal and print its estimate
    Prompt,
    /// Print the model's feature importances
    Importance,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    init_logging(&config.logging);

    info!("=== House Price Predictor v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => {
            let handle = install_recorder()?;
            let state = Arc::new(AppState::load(&config, Some(handle))?);
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            run_server(&addr, state).await?;
        }
        Commands::Prompt => {
            let engine = load_engine(&config)?;
            tokio::task::spawn_blocking(move || {
                let stdin = std::io::stdin();
                let mut stdout = std::io::stdout();
                terminal::run_prompt(&engine, stdin.lock(), &mut stdout)
            })
            .await
            .context("Prompt task panicked")??;
        }
        Commands::Importance => {
            let engine = load_engine(&config)?;
            terminal::print_importances(&engine.feature_importances(), &mut std::io::stdout())?;
        }
    }

    Ok(())
}

fn load_engine(config: &AppConfig) -> anyhow::Result<InferenceEngine> {
    InferenceEngine::load(&config.artifacts.paths(), config.validation.clone())
        .context("Failed to load inference artifacts")
}

//! # Tier CLI Binary
//!
//! Command-line interface for team and player tier rankings.

use anyhow::{Context, Result};
use clap::Parser;
use tier_engine::cli::{Cli, CliHandler};
use tier_engine::{TierEngine, TierEngineConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => TierEngineConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TierEngineConfig::from_env().context("Failed to load configuration from environment")?,
    };
    let engine = TierEngine::new(config)?;

    // Handle command
    let handler = CliHandler::new(engine, cli.data_path, cli.json);
    handler.handle_command(cli.command).await?;

    Ok(())
}

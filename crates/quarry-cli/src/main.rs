//! Quarry CLI - Command-line interface for the Quarry metadata miner.

use anyhow::Context;
use clap::Parser;
use quarry_cli::commands;
use quarry_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_init().unwrap_or_else(|e| {
            tracing::warn!("Using default configuration: {}", e);
            Config::default()
        }),
    };
    if let Some(database) = cli.database {
        config.database = Some(database);
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, &formatter).await?;
        }
        Command::Index(args) => {
            let database = config.database_path()?;
            commands::execute_index(args, &config, &database, &formatter).await?;
        }
        Command::Status(args) => {
            let database = config.database_path()?;
            commands::execute_status(args, &config, &database, &formatter)
                .await
                .with_context(|| format!("Failed to read {}", database.display()))?;
        }
    }

    Ok(())
}

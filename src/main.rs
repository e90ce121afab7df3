//! Kilde CLI entry point.

use anyhow::Result;
use clap::Parser;
use kilde::cli::{commands, Cli, Commands};
use kilde::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kilde={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Ingest { file } => {
            commands::run_ingest(file, &cli.tenant, settings).await?;
        }

        Commands::Youtube { url } => {
            commands::run_youtube(url, &cli.tenant, settings).await?;
        }

        Commands::Ask { question, model } => {
            commands::run_ask(question, model.clone(), &cli.tenant, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, &cli.tenant, settings).await?;
        }

        Commands::Status { all } => {
            commands::run_status(*all, &cli.tenant, settings).await?;
        }

        Commands::Clear { yes } => {
            commands::run_clear(*yes, &cli.tenant, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}

//! Doctor command - diagnostics for tools, keys, and storage.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::SqliteTenantStore;
use crate::openai::is_api_key_configured;
use anyhow::Result;
use console::style;
use std::process::Command;

/// Run the doctor command.
pub fn run_doctor(settings: &Settings) -> Result<()> {
    Output::header("Kilde Doctor");
    let mut problems = 0;

    // External tools
    println!("\n{}", style("External tools").bold());
    for (tool, version_arg, needed_for) in [
        ("pdftotext", "-v", "PDF ingestion"),
        ("yt-dlp", "--version", "YouTube ingestion"),
        ("ffmpeg", "-version", "media ingestion"),
        ("ffprobe", "-version", "media ingestion"),
    ] {
        if Command::new(tool).arg(version_arg).output().is_ok() {
            println!("  {} {} ({})", style("ok").green(), tool, needed_for);
        } else {
            println!("  {} {} missing ({})", style("!!").red(), tool, needed_for);
            problems += 1;
        }
    }

    // API key
    println!("\n{}", style("API configuration").bold());
    if is_api_key_configured() {
        println!("  {} OPENAI_API_KEY is set", style("ok").green());
    } else {
        println!("  {} OPENAI_API_KEY is not set", style("!!").red());
        problems += 1;
    }

    // Configuration
    println!("\n{}", style("Configuration").bold());
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        println!("  {} config file: {}", style("ok").green(), config_path.display());
    } else {
        println!(
            "  {} no config file (defaults in effect): {}",
            style("--").dim(),
            config_path.display()
        );
    }
    match settings.chunking.params() {
        Ok(params) => println!(
            "  {} chunking: window {} / overlap {}",
            style("ok").green(),
            params.window(),
            params.overlap()
        ),
        Err(e) => {
            println!("  {} chunking: {}", style("!!").red(), e);
            problems += 1;
        }
    }

    // Storage
    println!("\n{}", style("Storage").bold());
    let tenants_dir = settings.tenants_dir();
    match SqliteTenantStore::new(&tenants_dir) {
        Ok(store) => {
            let tenants = store.list_tenants()?;
            println!(
                "  {} tenant store: {} ({} knowledge base{})",
                style("ok").green(),
                tenants_dir.display(),
                tenants.len(),
                if tenants.len() == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            println!("  {} tenant store: {}", style("!!").red(), e);
            problems += 1;
        }
    }

    println!();
    if problems == 0 {
        Output::success("Everything looks good.");
    } else {
        Output::warning(&format!("{} problem(s) found.", problems));
    }

    Ok(())
}

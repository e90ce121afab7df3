//! Clear command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, Write};

/// Run the clear command.
pub async fn run_clear(yes: bool, tenant: &str, settings: Settings) -> Result<()> {
    if !yes && !confirm(tenant)? {
        Output::info("Aborted.");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(settings)?;
    orchestrator.clear(tenant).await?;

    Output::success(&format!("Knowledge base for '{}' cleared.", tenant));
    Ok(())
}

/// Prompt for confirmation before discarding data.
fn confirm(tenant: &str) -> io::Result<bool> {
    print!(
        "{} Discard the entire knowledge base for '{}'? {} ",
        style("?").cyan(),
        tenant,
        style("[y/N]").dim()
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

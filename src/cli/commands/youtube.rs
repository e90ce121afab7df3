//! Youtube command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the youtube command.
pub async fn run_youtube(url: &str, tenant: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::IngestYoutube) {
        Output::error(&format!("{}", e));
        Output::info("Run 'kilde doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Downloading, transcribing, and indexing...");

    match orchestrator.ingest_youtube(tenant, url).await {
        Ok(report) => {
            spinner.finish_and_clear();
            Output::success(&format!(
                "Indexed {} chunks into '{}'",
                report.chunks_indexed, tenant
            ));
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("YouTube ingestion failed: {}", e));
            Err(e.into())
        }
    }
}

//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, tenant: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        Output::info("Run 'kilde doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let retriever = orchestrator.retriever();

    let spinner = Output::spinner("Searching...");
    let retrieval = retriever.retrieve(tenant, query, limit).await;
    spinner.finish_and_clear();

    match retrieval {
        Ok(retrieval) => {
            if retrieval.is_empty() {
                Output::info(&format!(
                    "No results. Tenant '{}' has no matching documents yet.",
                    tenant
                ));
            } else {
                Output::header(&format!("Results for '{}'", query));
                for (rank, hit) in retrieval.hits.iter().enumerate() {
                    Output::search_hit(rank + 1, hit.distance, &hit.content);
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}

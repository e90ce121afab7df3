//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::TenantStore;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the status command.
pub async fn run_status(all: bool, tenant: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let store = orchestrator.sqlite_store();

    if all {
        let tenants = store.list_tenants()?;
        if tenants.is_empty() {
            Output::info("No knowledge bases yet.");
            return Ok(());
        }

        Output::header("Knowledge bases");
        for t in tenants {
            let count = store.chunk_count(&t).await?;
            Output::list_item(&format!("{} ({} chunks)", t, count));
        }
        return Ok(());
    }

    Output::header(&format!("Tenant '{}'", tenant));

    if !store.exists(tenant).await? {
        Output::kv("status", "no knowledge base yet");
        Output::info("Ingest something with 'kilde ingest <file>' to get started.");
        return Ok(());
    }

    Output::kv("chunks", &store.chunk_count(tenant).await?.to_string());
    if let Some(dimension) = store.dimension(tenant)? {
        Output::kv("dimensions", &dimension.to_string());
    }
    if let Some(created_at) = store.created_at(tenant)? {
        Output::kv("created", &created_at);
    }

    Ok(())
}

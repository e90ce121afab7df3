//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Content kinds the ingest command recognizes by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Pdf,
    Media,
    Text,
}

fn detect_kind(path: &Path) -> ContentKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => ContentKind::Pdf,
        "mp3" | "mp4" | "wav" | "m4a" | "opus" | "ogg" | "webm" | "mkv" | "mov" => {
            ContentKind::Media
        }
        _ => ContentKind::Text,
    }
}

/// Run the ingest command.
pub async fn run_ingest(file: &str, tenant: &str, settings: Settings) -> Result<()> {
    let path = Path::new(file);
    let kind = detect_kind(path);

    let operation = match kind {
        ContentKind::Pdf => Operation::IngestPdf,
        ContentKind::Media => Operation::IngestMedia,
        ContentKind::Text => Operation::Search, // only needs the API key
    };
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'kilde doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(match kind {
        ContentKind::Pdf => "Extracting and indexing PDF...",
        ContentKind::Media => "Transcribing and indexing media...",
        ContentKind::Text => "Indexing text...",
    });

    let result = match kind {
        ContentKind::Pdf => orchestrator.ingest_pdf(tenant, path).await,
        ContentKind::Media => orchestrator.ingest_media(tenant, path).await,
        ContentKind::Text => {
            let text = std::fs::read_to_string(path)?;
            orchestrator.ingest_text(tenant, &text).await
        }
    };

    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            if report.chunks_indexed == 0 {
                Output::warning("No content found to index.");
            } else {
                Output::success(&format!(
                    "Indexed {} chunks into '{}'",
                    report.chunks_indexed, tenant
                ));
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            Err(e.into())
        }
    }
}

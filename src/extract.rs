//! Plain-text extraction from PDFs.
//!
//! The ingestion pipeline only ever consumes extracted plain text; the actual
//! PDF parsing is delegated to the external `pdftotext` tool (poppler).

use crate::error::{KildeError, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Extract the plain text of a PDF file.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn pdf_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(KildeError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let result = Command::new("pdftotext")
        .arg("-layout")
        .arg(path)
        .arg("-") // write to stdout
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KildeError::ToolNotFound("pdftotext".into()));
        }
        Err(e) => {
            return Err(KildeError::Extraction(format!("pdftotext execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KildeError::Extraction(format!("pdftotext failed: {stderr}")));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!("Extracted {} characters", text.len());
    Ok(text)
}

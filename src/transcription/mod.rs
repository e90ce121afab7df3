//! Speech-to-text transcription.
//!
//! Transcription is treated as a black-box capability: the pipeline hands an
//! audio file to a `Transcriber` and gets plain text back.

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into plain text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

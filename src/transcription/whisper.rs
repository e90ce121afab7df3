//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::error::{KildeError, Result};
use crate::media::split_audio;
use crate::openai::shared_client;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::Path;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
///
/// Long audio is split into segments with ffmpeg and transcribed with bounded
/// concurrency; the segment texts are rejoined in playback order.
pub struct WhisperTranscriber {
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber with default settings.
    pub fn new() -> Self {
        Self::with_config("whisper-1", 120, 3)
    }

    /// Create a new Whisper transcriber with custom configuration.
    pub fn with_config(
        model: &str,
        chunk_duration_seconds: u32,
        max_concurrent_chunks: usize,
    ) -> Self {
        Self {
            model: model.to_string(),
            chunk_duration_seconds,
            max_concurrent_chunks,
        }
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<String> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| KildeError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = shared_client()
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| KildeError::OpenAI(format!("Whisper API error: {}", e)))?;

        Ok(response.text.trim().to_string())
    }
}

impl Default for WhisperTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if chunks.len() == 1 {
            return self.transcribe_single(audio_path).await;
        }

        let chunk_count = chunks.len();
        info!("Transcribing {} audio segments with {}", chunk_count, self.model);

        // Transcribe segments concurrently, then reassemble in playback order
        let results: Vec<(usize, Result<String>)> = stream::iter(chunks.into_iter().enumerate())
            .map(|(idx, chunk_path)| async move {
                let result = self.transcribe_single(&chunk_path).await;
                (idx, result)
            })
            .buffer_unordered(self.max_concurrent_chunks)
            .collect()
            .await;

        drop(temp_dir);

        let mut sorted: Vec<(usize, Result<String>)> = results;
        sorted.sort_by_key(|(idx, _)| *idx);

        let mut parts = Vec::with_capacity(chunk_count);
        for (idx, result) in sorted {
            match result {
                Ok(text) => parts.push(text),
                Err(e) => {
                    return Err(KildeError::Transcription(format!(
                        "Segment {} failed: {}",
                        idx, e
                    )));
                }
            }
        }

        Ok(parts.join(" "))
    }
}

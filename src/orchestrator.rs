//! Ingestion pipeline orchestrator for Kilde.
//!
//! Coordinates the chunk → embed → append path for each content source and
//! wires the external collaborators (extraction, download, transcription).

use crate::answer::AnswerEngine;
use crate::chunking::{chunk_words, ChunkingParams};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{KildeError, Result};
use crate::extract::pdf_text;
use crate::generation::{Generator, OpenAIGenerator};
use crate::index::{SqliteTenantStore, TenantStore};
use crate::media::{download_audio, extract_youtube_id, DownloadOptions};
use crate::retrieval::Retriever;
use crate::transcription::{Transcriber, WhisperTranscriber};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the Kilde pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    chunking: ChunkingParams,
    embedder: Arc<dyn Embedder>,
    store: Arc<SqliteTenantStore>,
    transcriber: Arc<dyn Transcriber>,
    temp_dir: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator with default configuration.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let chunking = settings.chunking.params()?;

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let store = Arc::new(SqliteTenantStore::new(&settings.tenants_dir())?);

        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::with_config(
            &settings.media.transcription_model,
            settings.media.chunk_duration_seconds,
            settings.media.max_concurrent_chunks,
        ));

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            settings,
            prompts,
            chunking,
            embedder,
            store,
            transcriber,
            temp_dir,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        store: Arc<SqliteTenantStore>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self> {
        let chunking = settings.chunking.params()?;
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            settings,
            prompts,
            chunking,
            embedder,
            store,
            transcriber,
            temp_dir,
        })
    }

    /// Get a reference to the tenant store (as trait object).
    pub fn store(&self) -> Arc<dyn TenantStore> {
        self.store.clone() as Arc<dyn TenantStore>
    }

    /// Get a reference to the SQLite store (for status reporting).
    pub fn sqlite_store(&self) -> Arc<SqliteTenantStore> {
        self.store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build a retriever over the store.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.embedder.clone(), self.store())
    }

    /// Build an answer engine with the configured model and prompts.
    pub fn answer_engine(&self) -> AnswerEngine {
        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(&self.settings.rag.model));
        AnswerEngine::new(
            generator,
            self.embedder.clone(),
            self.store(),
            self.prompts.clone(),
        )
        .with_top_k(self.settings.rag.top_k)
    }

    /// Ingest raw text: chunk, embed, and append to the tenant's index.
    ///
    /// This is the core ingestion path every content source funnels into.
    #[instrument(skip(self, text), fields(tenant = %tenant, chars = text.len()))]
    pub async fn ingest_text(&self, tenant: &str, text: &str) -> Result<IngestReport> {
        let chunks = chunk_words(text, &self.chunking);
        if chunks.is_empty() {
            info!("No content to index for tenant '{}'", tenant);
            return Ok(IngestReport { chunks_indexed: 0 });
        }

        info!("Embedding {} chunks for tenant '{}'", chunks.len(), tenant);
        let vectors = self.embedder.embed_batch(&chunks).await?;

        let appended = self.store.append(tenant, &vectors, &chunks).await?;
        Ok(IngestReport {
            chunks_indexed: appended,
        })
    }

    /// Ingest a PDF file: extract text, then run the core ingestion path.
    #[instrument(skip(self), fields(tenant = %tenant, path = %path.display()))]
    pub async fn ingest_pdf(&self, tenant: &str, path: &Path) -> Result<IngestReport> {
        info!("Extracting text from {}", path.display());
        let text = pdf_text(path).await?;
        self.ingest_text(tenant, &text).await
    }

    /// Ingest a local audio/video file: transcribe, then ingest the transcript.
    #[instrument(skip(self), fields(tenant = %tenant, path = %path.display()))]
    pub async fn ingest_media(&self, tenant: &str, path: &Path) -> Result<IngestReport> {
        if !path.exists() {
            return Err(KildeError::InvalidInput(format!(
                "File not found: {}",
                path.display()
            )));
        }

        info!("Transcribing {}", path.display());
        let transcript = self.transcriber.transcribe(path).await?;
        self.ingest_text(tenant, &transcript).await
    }

    /// Ingest a YouTube video: download audio, transcribe, ingest.
    #[instrument(skip(self), fields(tenant = %tenant, url = %url))]
    pub async fn ingest_youtube(&self, tenant: &str, url: &str) -> Result<IngestReport> {
        let video_id = extract_youtube_id(url).ok_or_else(|| {
            KildeError::InvalidInput(format!("Could not parse YouTube URL or id: {}", url))
        })?;

        let options = DownloadOptions::new(&self.settings.media.audio_format, self.temp_dir.clone())?;

        info!("Downloading audio for {}", video_id);
        let audio_path = download_audio(&video_id, &options).await?;

        let report = self.ingest_media(tenant, &audio_path).await;

        // Scratch audio is not part of the knowledge base
        let _ = std::fs::remove_file(&audio_path);

        report
    }

    /// Discard a tenant's knowledge base; safe when none exists.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn clear(&self, tenant: &str) -> Result<()> {
        self.store.clear(tenant).await
    }
}

/// Result of an ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    /// Number of chunks indexed.
    pub chunks_indexed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::tempdir;

    /// Deterministic embedder: a tiny bag-of-letters projection, so any chunk
    /// text maps to a stable 3-dimensional vector.
    struct HashEmbedder;

    fn hash_vector(text: &str) -> Vec<f32> {
        let mut v = [0.0f32; 3];
        for (i, byte) in text.bytes().enumerate() {
            v[i % 3] += (byte % 13) as f32;
        }
        v.to_vec()
    }

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(hash_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| hash_vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    struct FixedTranscriber(String);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn test_orchestrator(root: &Path) -> Orchestrator {
        let mut settings = Settings::default();
        settings.general.data_dir = root.join("data").to_string_lossy().into_owned();
        settings.general.temp_dir = root.join("tmp").to_string_lossy().into_owned();
        settings.store.tenants_dir = root.join("tenants").to_string_lossy().into_owned();
        settings.chunking.window = 4;
        settings.chunking.overlap = 1;

        let store = Arc::new(SqliteTenantStore::new(&settings.tenants_dir()).unwrap());
        Orchestrator::with_components(
            settings,
            Prompts::default(),
            Arc::new(HashEmbedder),
            store,
            Arc::new(FixedTranscriber("hello from the transcript".to_string())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ingest_text_chunks_embeds_and_appends() {
        let dir = tempdir().unwrap();
        let orchestrator = test_orchestrator(dir.path());

        let report = orchestrator
            .ingest_text("alice", "one two three four five six seven")
            .await
            .unwrap();

        // window=4, overlap=1 -> step=3: two windows cover seven words
        assert_eq!(report.chunks_indexed, 2);
        assert_eq!(orchestrator.store().chunk_count("alice").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_ingest_empty_text_is_a_no_op() {
        let dir = tempdir().unwrap();
        let orchestrator = test_orchestrator(dir.path());

        let report = orchestrator.ingest_text("alice", "   ").await.unwrap();
        assert_eq!(report.chunks_indexed, 0);
        assert!(!orchestrator.store().exists("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_ingest_media_funnels_transcript_into_index() {
        let dir = tempdir().unwrap();
        let orchestrator = test_orchestrator(dir.path());

        // The stub transcriber ignores the file contents, but the path must exist
        let audio = dir.path().join("talk.mp3");
        std::fs::write(&audio, b"fake audio").unwrap();

        let report = orchestrator.ingest_media("alice", &audio).await.unwrap();
        assert_eq!(report.chunks_indexed, 1);

        let hits = orchestrator
            .store()
            .search("alice", &HashEmbedder.embed("hello from the transcript").await.unwrap(), 1)
            .await
            .unwrap();
        assert_eq!(hits[0].content, "hello from the transcript");
    }

    #[tokio::test]
    async fn test_clear_resets_tenant() {
        let dir = tempdir().unwrap();
        let orchestrator = test_orchestrator(dir.path());

        orchestrator.ingest_text("alice", "some words here").await.unwrap();
        orchestrator.clear("alice").await.unwrap();
        assert!(!orchestrator.store().exists("alice").await.unwrap());

        // Clearing again is still fine
        orchestrator.clear("alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_youtube_input_rejected() {
        let dir = tempdir().unwrap();
        let orchestrator = test_orchestrator(dir.path());

        let err = orchestrator
            .ingest_youtube("alice", "not a youtube link")
            .await
            .unwrap_err();
        assert!(matches!(err, KildeError::InvalidInput(_)));
    }
}

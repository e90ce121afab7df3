//! Kilde - Multi-Tenant Knowledge Grounding and RAG
//!
//! A local-first CLI tool for building per-user knowledge bases and asking
//! grounded questions against them.
//!
//! The name "Kilde" comes from the Norwegian/Scandinavian word for "source."
//!
//! # Overview
//!
//! Kilde allows you to:
//! - Ingest PDFs, local audio/video files, and YouTube videos into a per-tenant
//!   knowledge base
//! - Ask questions answered strictly from your own documents
//! - See two independent confidence signals per answer: retrieval similarity
//!   and the model's self-reported confidence
//! - Keep every tenant's data fully isolated on disk
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `chunking` - Overlapping word-window chunking
//! - `embedding` - Embedding generation
//! - `index` - Per-tenant vector index and chunk store
//! - `retrieval` - Nearest-neighbor retrieval
//! - `generation` - Generative answer capability
//! - `answer` - Grounded question answering with confidence scoring
//! - `extract` - PDF text extraction
//! - `media` - Audio download
//! - `transcription` - Speech-to-text transcription
//! - `orchestrator` - Ingestion pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use kilde::config::Settings;
//! use kilde::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Ingest a PDF into the "alice" knowledge base
//!     let report = orchestrator.ingest_pdf("alice", "notes.pdf".as_ref()).await?;
//!     println!("Indexed {} chunks", report.chunks_indexed);
//!
//!     // Ask a question against it
//!     let answer = orchestrator.answer_engine().ask("alice", "What are the notes about?").await?;
//!     println!("{} (similarity {:.0}%)", answer.answer, answer.similarity_score);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod retrieval;
pub mod transcription;

pub use error::{KildeError, Result};

//! CLI module for Kilde.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Kilde - Knowledge Grounding and RAG
///
/// A local-first CLI tool for building per-user knowledge bases from PDFs,
/// media files, and YouTube, and asking grounded questions against them.
/// The name "Kilde" comes from the Norwegian/Scandinavian word for "source."
#[derive(Parser, Debug)]
#[command(name = "kilde")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Tenant whose knowledge base to operate on
    #[arg(short, long, global = true, default_value = "default")]
    pub tenant: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Kilde and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Ingest a file (PDF, audio/video, or plain text) into the knowledge base
    Ingest {
        /// Path to the file to ingest
        file: String,
    },

    /// Ingest a YouTube video's audio into the knowledge base
    Youtube {
        /// YouTube URL or 11-character video id
        url: String,
    },

    /// Ask a question answered from your knowledge base
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search for relevant chunks without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show knowledge base status
    Status {
        /// List every tenant instead of just the selected one
        #[arg(long)]
        all: bool,
    },

    /// Clear the tenant's knowledge base
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Open configuration file in editor
    Edit,
}

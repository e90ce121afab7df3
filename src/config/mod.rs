//! Configuration module for Kilde.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{GroundingPrompts, Prompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, MediaSettings, PromptSettings,
    RagSettings, Settings, StoreSettings,
};

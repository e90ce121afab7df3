//! Generative answer capability.
//!
//! The answer engine treats generation as a black box that turns a prompt into
//! text; everything about the model's output format is best-effort and handled
//! by the caller.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for generative model implementations.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for the given system and user prompts.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

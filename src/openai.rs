//! OpenAI client configuration with sensible defaults.

use async_openai::{config::OpenAIConfig, Client};
use std::sync::OnceLock;
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

static SHARED_CLIENT: OnceLock<Client<OpenAIConfig>> = OnceLock::new();

/// Process-wide OpenAI client, initialized lazily on first use.
///
/// All embedding, transcription, and generation calls share this handle; it is
/// safe for concurrent use by multiple in-flight requests.
pub fn shared_client() -> &'static Client<OpenAIConfig> {
    SHARED_CLIENT.get_or_init(|| create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
}

/// Create a dedicated OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty())
}

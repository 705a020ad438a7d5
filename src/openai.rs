//! OpenAI client configuration built from explicit settings.

use crate::config::GenerationSettings;
use crate::error::{LecternError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from generation settings.
///
/// The API key and base URL come from `settings` rather than process-wide
/// state, so several differently configured clients can coexist.
pub fn create_client(settings: &GenerationSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| LecternError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new();
    if let Some(key) = settings.resolve_api_key() {
        config = config.with_api_key(key);
    }
    if let Some(base) = settings.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

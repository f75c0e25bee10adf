//! Client setup for OpenAI-compatible APIs (OpenAI itself, or Ollama's `/v1` endpoint).

use crate::config::ProviderSettings;
use crate::error::{Result, VidqaError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Key sent when the configured variable is unset. Local servers ignore it.
const PLACEHOLDER_API_KEY: &str = "ollama";

/// Create a client for the configured provider.
pub fn create_client(provider: &ProviderSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = std::env::var(&provider.api_key_env)
        .ok()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string());

    create_client_with_timeout(
        &provider.api_base,
        &api_key,
        Duration::from_secs(provider.timeout_seconds),
    )
}

/// Create a client against an explicit base URL with a custom timeout.
pub fn create_client_with_timeout(
    api_base: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VidqaError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Whether the base URL points at this machine (no API key needed).
pub fn is_local_api_base(api_base: &str) -> bool {
    url::Url::parse(api_base)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|host| matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]" | "::1"))
        .unwrap_or(false)
}

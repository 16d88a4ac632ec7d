//! Client for the local model server's OpenAI-compatible API.

use crate::config::ServerSettings;
use crate::error::{CueragError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured model server.
pub fn create_client(server: &ServerSettings) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(server, Duration::from_secs(server.timeout_secs))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    server: &ServerSettings,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CueragError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(server.base_url.trim_end_matches('/'))
        .with_api_key(&server.api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::config::Config;

    #[test]
    fn test_client_uses_configured_base() {
        let server = ServerSettings {
            base_url: "http://127.0.0.1:9999/v1/".to_string(),
            ..ServerSettings::default()
        };
        let client = create_client(&server).unwrap();
        assert_eq!(client.config().api_base(), "http://127.0.0.1:9999/v1");
    }
}

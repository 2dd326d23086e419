//! OpenAI client configuration with sensible defaults.

use crate::error::{NewscastError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client using the key stored in `api_key_env`.
///
/// Fails when the variable is unset or empty so callers can degrade the
/// feature instead of sending unauthenticated requests.
pub fn create_client(api_key_env: &str) -> Result<Client<OpenAIConfig>> {
    let api_key = std::env::var(api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| NewscastError::Config(format!("{} is not set", api_key_env)))?;
    create_client_with_timeout(&api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with an explicit key and timeout.
pub fn create_client_with_timeout(api_key: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NewscastError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::default().with_api_key(api_key);
    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let result = create_client("NEWSCAST_TEST_UNSET_OPENAI_KEY");
        assert!(matches!(result, Err(NewscastError::Config(_))));
    }
}

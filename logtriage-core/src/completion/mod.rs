use anyhow::Result;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::ProviderSettings;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Authentication failed")]
    Authentication,
    #[error("Rate limited")]
    RateLimited,
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),
}

/// Whether a completion should return free text or a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    JsonObject,
}

/// One request/response round-trip against an LLM completion service.
///
/// Implementations return the model's raw textual output; when
/// `OutputMode::JsonObject` was requested the text is expected to be a
/// JSON-encoded object, but parsing it is the caller's concern.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        mode: OutputMode,
    ) -> Result<String, CompletionError>;

    fn provider_name(&self) -> &str;
}

pub fn create_client(
    provider_name: &str,
    api_key: &str,
    settings: Option<&ProviderSettings>,
) -> Result<Box<dyn CompletionClient>> {
    info!("Creating completion client for provider: {}", provider_name);
    match provider_name.to_lowercase().as_str() {
        "openai" => {
            debug!("Initializing OpenAI client");
            let mut client = OpenAiClient::new(api_key.to_string());
            if let Some(settings) = settings {
                client = client.with_settings(settings);
            }
            Ok(Box::new(client))
        }
        "anthropic" | "claude" => {
            debug!("Initializing Anthropic client");
            let mut client = AnthropicClient::new(api_key.to_string());
            if let Some(settings) = settings {
                client = client.with_settings(settings);
            }
            Ok(Box::new(client))
        }
        _ => {
            error!("Unsupported completion provider: {}", provider_name);
            Err(CompletionError::UnsupportedProvider(provider_name.to_string()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_known_providers() {
        assert!(create_client("openai", "test_key", None).is_ok());
        assert!(create_client("anthropic", "test_key", None).is_ok());
        assert!(create_client("Claude", "test_key", None).is_ok());
    }

    #[test]
    fn test_create_client_unknown_provider() {
        let result = create_client("cohere", "test_key", None);
        assert!(result.is_err());
    }
}

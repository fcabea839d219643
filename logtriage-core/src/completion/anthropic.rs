use crate::completion::{CompletionClient, CompletionError, OutputMode};
use crate::config::ProviderSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_settings(mut self, settings: &ProviderSettings) -> Self {
        if let Some(model) = &settings.model {
            self.model = model.clone();
        }
        if let Some(temperature) = settings.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = settings.max_tokens {
            self.max_tokens = max_tokens;
        }
        self
    }
}

#[async_trait::async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        _mode: OutputMode,
    ) -> Result<String, CompletionError> {
        // The messages API has no structured-output switch; JSON-mode steps
        // rely on the instruction text and the caller parses the result.
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if response.status() == 401 {
            return Err(CompletionError::Authentication);
        }

        if response.status() == 429 {
            return Err(CompletionError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            CompletionError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let content = anthropic_response
            .content
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("No content in response".to_string()))?;

        Ok(content.text)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

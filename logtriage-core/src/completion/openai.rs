use crate::completion::{CompletionClient, CompletionError, OutputMode};
use crate::config::ProviderSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_MAX_TOKENS: u32 = 2000;
// Low but non-zero: deterministic-leaning output with consistent tone
// across the analysis steps.
const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
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
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        mode: OutputMode,
    ) -> Result<String, CompletionError> {
        let messages = vec![
            OpenAiMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            OpenAiMessage {
                role: "user".to_string(),
                content: user.to_string(),
            },
        ];

        let response_format = match mode {
            OutputMode::JsonObject => Some(OpenAiResponseFormat {
                format_type: "json_object".to_string(),
            }),
            OutputMode::Text => None,
        };

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
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

        let openai_response: OpenAiResponse = response.json().await.map_err(|e| {
            CompletionError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("No choices in response".to_string()))?;

        Ok(choice.message.content)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

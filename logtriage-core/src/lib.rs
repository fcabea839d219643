// LogTriage Library - Incident report generation from operational logs
//
// This library turns a raw log file into a structured incident-analysis
// report by running a fixed chain of LLM completion calls. It is used by
// the CLI binary and is embeddable on its own.

use anyhow::Result;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod audit;
pub mod completion;
pub mod config;
pub mod input;
pub mod pipeline;
pub mod prompts;
pub mod renderer;
pub mod scrub;

pub use audit::{record_run, RunStatus};
pub use completion::{
    create_client, AnthropicClient, CompletionClient, CompletionError, OpenAiClient, OutputMode,
};
pub use config::{Config, ProviderSettings};
pub use pipeline::{
    AnalysisResult, Pipeline, LOG_LENGTH_THRESHOLD, MAX_COMPLETION_CALLS, MAX_LOG_LENGTH,
};
pub use prompts::PromptStore;
pub use renderer::render_report;
pub use scrub::{mask_sensitive, scan_error_signals};

/// Failures that occur while wiring up an analysis run, before any
/// completion call is made. These are the only errors that escape the
/// library; everything later is folded into the `AnalysisResult`.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("API key required for provider {provider}. Set the {env_var} environment variable")]
    MissingApiKey { provider: String, env_var: String },
    #[error("Failed to initialize completion client: {0}")]
    Client(anyhow::Error),
    #[error("Failed to load prompt templates: {0}")]
    Prompts(anyhow::Error),
    #[error("Failed to load configuration: {0}")]
    Config(anyhow::Error),
}

/// Entry point tying config, completion client, prompt store, and the
/// analysis pipeline together.
pub struct LogTriage {
    config: Config,
}

impl LogTriage {
    pub fn new() -> Result<Self> {
        let config = Config::load().map_err(SetupError::Config)?;
        Ok(Self { config })
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze raw log text. Sensitive values are masked before the text
    /// leaves the process. Returns `Err` only for setup failures; any
    /// failure past setup is embedded in the result fields.
    pub async fn analyze_text(
        &self,
        raw_text: &str,
        provider_override: Option<&str>,
        api_key_override: Option<&str>,
    ) -> Result<AnalysisResult> {
        let provider = provider_override
            .map(str::to_string)
            .unwrap_or_else(|| self.config.get_default_provider());

        let api_key = match api_key_override {
            Some(key) => key.to_string(),
            None => self.config.get_api_key(&provider).ok_or_else(|| {
                let env_var = format!(
                    "{}_API_KEY",
                    Config::canonical_provider(&provider).to_uppercase()
                );
                SetupError::MissingApiKey {
                    provider: provider.clone(),
                    env_var,
                }
            })?,
        };

        let settings = self.config.get_provider_settings(&provider);
        let client =
            create_client(&provider, &api_key, settings).map_err(SetupError::Client)?;

        let store =
            PromptStore::load(&self.config.prompts_dir()).map_err(SetupError::Prompts)?;

        let masked = mask_sensitive(raw_text);
        debug!(
            "Masked log text prepared ({} characters)",
            masked.chars().count()
        );

        info!("Starting analysis with provider: {}", provider);
        let pipeline = Pipeline::new(client, store);
        Ok(pipeline.analyze(&masked).await)
    }

    /// Analyze a log file from disk.
    pub async fn analyze_file(
        &self,
        file_path: &Path,
        provider_override: Option<&str>,
        api_key_override: Option<&str>,
    ) -> Result<AnalysisResult> {
        let raw_text = input::read_log_file(file_path).await?;
        self.analyze_text(&raw_text, provider_override, api_key_override)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_a_setup_error() {
        let triage = LogTriage::with_config(Config::default());
        let result = triage
            .analyze_text("ERROR: boom", Some("nosuchprovider"), None)
            .await;

        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SetupError>(),
            Some(SetupError::MissingApiKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_provider_is_a_client_error() {
        let triage = LogTriage::with_config(Config::default());
        let result = triage
            .analyze_text("ERROR: boom", Some("nosuchprovider"), Some("key"))
            .await;

        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SetupError>(),
            Some(SetupError::Client(_))
        ));
    }
}

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub providers: ProviderConfig,
    pub defaults: DefaultConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub openai: Option<ProviderSettings>,
    pub anthropic: Option<ProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultConfig {
    pub provider: Option<String>,
    pub prompts_dir: Option<String>,
    pub audit_log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProviderConfig {
                openai: Some(ProviderSettings {
                    model: Some("gpt-4-turbo-preview".to_string()),
                    temperature: Some(0.2),
                    max_tokens: Some(2000),
                    api_key: None,
                }),
                anthropic: Some(ProviderSettings {
                    model: Some("claude-3-5-haiku-latest".to_string()),
                    temperature: Some(0.2),
                    max_tokens: Some(2000),
                    api_key: None,
                }),
            },
            defaults: DefaultConfig {
                provider: Some("openai".to_string()),
                prompts_dir: Some("prompts".to_string()),
                audit_log: Some("usage.log".to_string()),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                let content = fs::read_to_string(&config_path)?;

                // Parse if possible; an unreadable file falls back to defaults.
                if let Ok(mut config) = toml::from_str::<Config>(&content) {
                    let default = Config::default();
                    config.merge_with_defaults(&default);
                    return Ok(config);
                }
            }
        }
        Ok(Config::default())
    }

    /// Resolve the API key for a provider. Environment variables win over
    /// the config file; absence is the caller's fatal condition.
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        let canonical = Self::canonical_provider(provider);
        if let Ok(key) = env::var(format!("{}_API_KEY", canonical.to_uppercase())) {
            return Some(key);
        }

        self.get_provider_settings(provider)
            .and_then(|settings| settings.api_key.clone())
    }

    pub fn get_provider_settings(&self, provider: &str) -> Option<&ProviderSettings> {
        match Self::canonical_provider(provider) {
            "openai" => self.providers.openai.as_ref(),
            "anthropic" => self.providers.anthropic.as_ref(),
            _ => None,
        }
    }

    pub fn get_default_provider(&self) -> String {
        self.defaults
            .provider
            .as_deref()
            .unwrap_or("openai")
            .to_string()
    }

    pub fn prompts_dir(&self) -> PathBuf {
        PathBuf::from(self.defaults.prompts_dir.as_deref().unwrap_or("prompts"))
    }

    pub fn audit_log_path(&self) -> PathBuf {
        PathBuf::from(self.defaults.audit_log.as_deref().unwrap_or("usage.log"))
    }

    pub(crate) fn canonical_provider(provider: &str) -> &'static str {
        match provider.to_lowercase().as_str() {
            "openai" => "openai",
            "anthropic" | "claude" => "anthropic",
            _ => "unknown",
        }
    }

    fn get_config_path() -> Option<PathBuf> {
        // Check for project-level config first
        if let Ok(current_dir) = env::current_dir() {
            let project_config = current_dir.join(".logtriage.toml");
            if project_config.exists() {
                return Some(project_config);
            }
        }

        // Check for user-level config
        if let Some(home_dir) = dirs::home_dir() {
            let user_config = home_dir.join(".config").join("logtriage").join("config.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    fn merge_with_defaults(&mut self, defaults: &Config) {
        if self.providers.openai.is_none() {
            self.providers.openai = defaults.providers.openai.clone();
        }
        if self.providers.anthropic.is_none() {
            self.providers.anthropic = defaults.providers.anthropic.clone();
        }

        if self.defaults.provider.is_none() {
            self.defaults.provider = defaults.defaults.provider.clone();
        }
        if self.defaults.prompts_dir.is_none() {
            self.defaults.prompts_dir = defaults.defaults.prompts_dir.clone();
        }
        if self.defaults.audit_log.is_none() {
            self.defaults.audit_log = defaults.defaults.audit_log.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.get_default_provider(), "openai");
        assert_eq!(config.prompts_dir(), PathBuf::from("prompts"));
        assert_eq!(config.audit_log_path(), PathBuf::from("usage.log"));
    }

    #[test]
    fn test_provider_settings_lookup() {
        let config = Config::default();
        let openai = config.get_provider_settings("openai").unwrap();
        assert_eq!(openai.model.as_deref(), Some("gpt-4-turbo-preview"));

        // "claude" is an accepted alias for the anthropic settings.
        let anthropic = config.get_provider_settings("claude").unwrap();
        assert_eq!(anthropic.model.as_deref(), Some("claude-3-5-haiku-latest"));
    }

    #[test]
    fn test_config_file_api_key() {
        let mut config = Config::default();
        config.providers.openai.as_mut().unwrap().api_key = Some("from-file".to_string());
        // No OPENAI_API_KEY is set in the test environment, so the config
        // file value is returned.
        if env::var("OPENAI_API_KEY").is_err() {
            assert_eq!(config.get_api_key("openai").as_deref(), Some("from-file"));
        }
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let partial: Config = toml::from_str(
            r#"
            [providers]
            [defaults]
            provider = "anthropic"
            "#,
        )
        .unwrap();
        let mut config = partial;
        config.merge_with_defaults(&Config::default());

        assert_eq!(config.get_default_provider(), "anthropic");
        assert!(config.providers.openai.is_some());
        assert_eq!(config.prompts_dir(), PathBuf::from("prompts"));
    }
}

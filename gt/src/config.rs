//! GoalTracker configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use goalstore::config::StorageConfig;

/// Main GoalTracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Goal storage configuration
    pub storage: StorageConfig,

    /// Router prompt configuration
    pub prompt: PromptConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key is available for providers that need one and
    /// that the storage backend has what it needs. Call this early in startup
    /// to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        let llm = self.llm.resolve();
        if llm.provider.requires_api_key() {
            llm.get_api_key()?;
        }
        self.storage.validate().context("Invalid storage configuration")?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./goaltracker.yml
        let local_config = PathBuf::from("goaltracker.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/goaltracker/goaltracker.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("goaltracker").join("goaltracker.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    Ollama,
    Anthropic,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Ollama => "llama3.1",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com",
            Self::Ollama => "http://localhost:11434",
            Self::Anthropic => "https://api.anthropic.com",
        }
    }

    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Ollama => None,
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }

    /// Local Ollama servers accept unauthenticated requests
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// LLM provider configuration
///
/// Unset model, base URL and key variable fall back to the provider's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: openai, ollama or anthropic
    pub provider: Provider,

    /// Model identifier
    pub model: Option<String>,

    /// Inline API key (takes precedence over `api-key-env`)
    #[serde(rename = "api-key", skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient failures (never for rate limits)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAI,
            model: None,
            api_key: None,
            api_key_env: None,
            base_url: None,
            max_tokens: 1024,
            timeout_ms: 120_000,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Fill unset fields from the provider defaults
    pub fn resolve(&self) -> ResolvedLlmConfig {
        ResolvedLlmConfig {
            provider: self.provider,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| self.provider.default_model().to_string()),
            api_key: self.api_key.clone(),
            api_key_env: self
                .api_key_env
                .clone()
                .or_else(|| self.provider.default_api_key_env().map(String::from)),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| self.provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
        }
    }
}

/// LLM configuration with every default applied
#[derive(Clone)]
pub struct ResolvedLlmConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl std::fmt::Debug for ResolvedLlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedLlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ResolvedLlmConfig {
    /// Inline key, else the key environment variable
    pub fn get_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }

        match &self.api_key_env {
            Some(var) => std::env::var(var)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| eyre::eyre!("LLM API key not found. Set the {} environment variable.", var)),
            None => Err(eyre::eyre!(
                "LLM API key not found. Set api-key or api-key-env for provider {}.",
                self.provider
            )),
        }
    }
}

/// Router prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Handlebars file replacing the embedded system prompt
    #[serde(rename = "system-template")]
    pub system_template: Option<String>,

    /// Number of past conversation turns sent with each utterance
    #[serde(rename = "history-turns")]
    pub history_turns: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_template: None,
            history_turns: 10,
        }
    }
}

impl PromptConfig {
    /// Template override path with `~/` expanded
    pub fn system_template_path(&self) -> Option<PathBuf> {
        self.system_template.as_deref().map(goalstore::config::expand_home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goalstore::config::StorageType;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, Provider::OpenAI);
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.max_retries, 0);
        assert_eq!(config.storage.storage_type, StorageType::Csv);
        assert_eq!(config.prompt.history_turns, 10);
    }

    #[test]
    fn test_resolve_provider_defaults() {
        let resolved = LlmConfig::default().resolve();
        assert_eq!(resolved.model, "gpt-4o");
        assert_eq!(resolved.base_url, "https://api.openai.com");
        assert_eq!(resolved.api_key_env.as_deref(), Some("OPENAI_API_KEY"));

        let ollama = LlmConfig {
            provider: Provider::Ollama,
            ..Default::default()
        }
        .resolve();
        assert_eq!(ollama.base_url, "http://localhost:11434");
        assert!(ollama.api_key_env.is_none());
        assert!(!ollama.provider.requires_api_key());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: anthropic
  model: claude-opus-4
  api-key-env: MY_API_KEY
  base-url: https://api.example.com/
  max-tokens: 512
  timeout-ms: 60000
  max-retries: 2

storage:
  type: csv
  csv-file: /tmp/goals.csv

prompt:
  history-turns: 4
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let llm = config.llm.resolve();

        assert_eq!(llm.provider, Provider::Anthropic);
        assert_eq!(llm.model, "claude-opus-4");
        assert_eq!(llm.api_key_env.as_deref(), Some("MY_API_KEY"));
        assert_eq!(llm.base_url, "https://api.example.com");
        assert_eq!(llm.max_tokens, 512);
        assert_eq!(llm.max_retries, 2);
        assert_eq!(config.storage.csv_file, "/tmp/goals.csv");
        assert_eq!(config.prompt.history_turns, 4);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gpt-4o-mini
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.llm.resolve().model, "gpt-4o-mini");

        // Defaults for unspecified
        assert_eq!(config.llm.provider, Provider::OpenAI);
        assert_eq!(config.llm.timeout_ms, 120_000);
        assert_eq!(config.storage.spreadsheet_name, "SQUAD GOALS");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("llm:\n  provider: cohere\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_inline_api_key_wins() {
        let llm = LlmConfig {
            api_key: Some("sk-inline".to_string()),
            api_key_env: Some("GOALTRACKER_TEST_UNSET_KEY".to_string()),
            ..Default::default()
        };
        assert_eq!(llm.resolve().get_api_key().unwrap(), "sk-inline");
    }

    #[test]
    #[serial]
    fn test_api_key_from_env() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe { std::env::set_var("GOALTRACKER_TEST_KEY", "sk-env") };
        let llm = LlmConfig {
            api_key_env: Some("GOALTRACKER_TEST_KEY".to_string()),
            ..Default::default()
        };
        assert_eq!(llm.resolve().get_api_key().unwrap(), "sk-env");
        unsafe { std::env::remove_var("GOALTRACKER_TEST_KEY") };
    }

    #[test]
    #[serial]
    fn test_validate_missing_key() {
        let config = Config {
            llm: LlmConfig {
                api_key_env: Some("GOALTRACKER_TEST_MISSING_KEY".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GOALTRACKER_TEST_MISSING_KEY"));
    }

    #[test]
    fn test_validate_ollama_needs_no_key() {
        let config = Config {
            llm: LlmConfig {
                provider: Provider::Ollama,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = Config {
            llm: LlmConfig {
                api_key: Some("sk-secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
    }
}

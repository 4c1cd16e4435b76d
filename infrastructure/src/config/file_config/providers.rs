//! Provider configuration from TOML (`[providers]` section)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xpcs_domain::{ConfigIssue, ConfigIssueCode};

/// Provider names the routing gateway knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["anthropic", "openai"];

/// Anthropic API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key (prefer the environment variable).
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Default max tokens per response.
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            temperature: None,
            api_version: "2023-06-01".to_string(),
        }
    }
}

impl FileAnthropicConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// OpenAI-compatible API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (prefer the environment variable).
    pub api_key: Option<String>,
    /// Base URL; point it at vLLM, Ollama or Azure for compatible servers.
    pub base_url: String,
    /// Default max tokens per response.
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 4096,
            temperature: None,
        }
    }
}

impl FileOpenAiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

fn resolve_key(direct: Option<&str>, env_name: &str) -> Option<String> {
    direct
        .map(str::to_string)
        .or_else(|| std::env::var(env_name).ok())
        .filter(|k| !k.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Default provider: "anthropic" or "openai".
    pub default: Option<String>,
    /// Anthropic API settings.
    pub anthropic: FileAnthropicConfig,
    /// OpenAI API settings.
    pub openai: FileOpenAiConfig,
    /// Explicit model → provider routing overrides.
    pub routing: BTreeMap<String, String>,
    /// Per-request timeout; unset means wait indefinitely.
    pub timeout_seconds: Option<u64>,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            default: None,
            anthropic: FileAnthropicConfig::default(),
            openai: FileOpenAiConfig::default(),
            routing: BTreeMap::new(),
            timeout_seconds: Some(120),
            max_retries: 3,
        }
    }
}

impl FileProvidersConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let unknown = |name: &str| !KNOWN_PROVIDERS.contains(&name.to_lowercase().as_str());
        if let Some(default) = &self.default
            && unknown(default)
        {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownProvider,
                format!(
                    "providers.default: unknown provider '{}' (expected one of: {})",
                    default,
                    KNOWN_PROVIDERS.join(", ")
                ),
            ));
        }
        for (model, provider) in &self.routing {
            if unknown(provider) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownProvider,
                    format!("providers.routing.\"{}\": unknown provider '{}'", model, provider),
                ));
            }
        }

        if self.timeout_seconds == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTimeout,
                "providers.timeout_seconds: must be greater than 0 (omit it to disable the timeout)",
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_providers() {
        let toml_str = r#"
default = "openai"
timeout_seconds = 30

[openai]
base_url = "http://localhost:8000/v1"
temperature = 0.2

[routing]
"llama-3.1-70b" = "openai"
"#;
        let config: FileProvidersConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default.as_deref(), Some("openai"));
        assert_eq!(config.openai.base_url, "http://localhost:8000/v1");
        assert_eq!(config.openai.temperature, Some(0.2));
        assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.routing["llama-3.1-70b"], "openai");
        assert_eq!(config.max_retries, 3);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_unknown_providers_flagged() {
        let config = FileProvidersConfig {
            default: Some("bedrock".into()),
            routing: [("gpt-5".to_string(), "azure".to_string())].into(),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.code == ConfigIssueCode::UnknownProvider));
    }

    #[test]
    fn test_zero_timeout_flagged() {
        let config = FileProvidersConfig {
            timeout_seconds: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate()[0].code, ConfigIssueCode::ZeroTimeout);
    }

    #[test]
    fn test_direct_key_wins_over_env() {
        let config = FileOpenAiConfig {
            api_key: Some("sk-direct".into()),
            api_key_env: "XPCS_TEST_UNSET_KEY_VAR".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-direct"));

        let config = FileOpenAiConfig {
            api_key: None,
            api_key_env: "XPCS_TEST_UNSET_KEY_VAR".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key(), None);
    }
}

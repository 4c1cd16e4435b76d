//! Model selection from TOML (`[models]` section)

use serde::{Deserialize, Serialize};
use xpcs_domain::{ConfigIssue, ConfigIssueCode, Model};

/// Per-task model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// default = "claude-sonnet-4-5"   # Fallback for every task
/// draft = "claude-opus-4-5"       # Hypothesis drafting
/// narrative = "gpt-4.1-mini"      # Feasibility narratives
/// chat = "claude-haiku-4-5"       # Ask and the chat REPL
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub default: Option<String>,
    pub draft: Option<String>,
    pub narrative: Option<String>,
    pub chat: Option<String>,
}

impl FileModelsConfig {
    /// Parse a single model string, collecting issues for empty names.
    fn parse_single_model(field: &str, value: Option<&String>) -> (Option<Model>, Vec<ConfigIssue>) {
        match value {
            None => (None, Vec::new()),
            Some(s) if s.trim().is_empty() => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    format!("models.{}: model name cannot be empty", field),
                )],
            ),
            Some(s) => {
                // Model::from_str is infallible; unknown names become Custom(...)
                let Ok(model) = s.parse::<Model>();
                (Some(model), Vec::new())
            }
        }
    }

    pub fn parse_default(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("default", self.default.as_ref())
    }

    pub fn parse_draft(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("draft", self.draft.as_ref())
    }

    pub fn parse_narrative(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("narrative", self.narrative.as_ref())
    }

    pub fn parse_chat(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("chat", self.chat.as_ref())
    }

    /// The configured default, or the built-in one.
    pub fn default_model(&self) -> Model {
        self.parse_default().0.unwrap_or_default()
    }

    pub fn draft_model(&self) -> Model {
        self.parse_draft().0.unwrap_or_else(|| self.default_model())
    }

    pub fn narrative_model(&self) -> Model {
        self.parse_narrative().0.unwrap_or_else(|| self.default_model())
    }

    pub fn chat_model(&self) -> Model {
        self.parse_chat().0.unwrap_or_else(|| self.default_model())
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.parse_default().1);
        issues.extend(self.parse_draft().1);
        issues.extend(self.parse_narrative().1);
        issues.extend(self.parse_chat().1);
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_models_fall_back_to_default() {
        let config = FileModelsConfig {
            default: Some("gpt-4.1".into()),
            draft: Some("claude-opus-4.5".into()),
            ..Default::default()
        };
        assert_eq!(config.draft_model(), Model::ClaudeOpus45);
        assert_eq!(config.narrative_model(), Model::Gpt41);
        assert_eq!(config.chat_model(), Model::Gpt41);
    }

    #[test]
    fn test_builtin_default_when_unset() {
        assert_eq!(FileModelsConfig::default().chat_model(), Model::default());
    }

    #[test]
    fn test_empty_name_is_error() {
        let config = FileModelsConfig {
            narrative: Some("  ".into()),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::EmptyModelName);
        assert!(issues[0].message.contains("models.narrative"));
        // Empty falls back instead of producing an empty model name
        assert_eq!(config.narrative_model(), Model::default());
    }
}

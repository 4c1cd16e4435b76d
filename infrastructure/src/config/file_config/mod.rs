//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod harvest;
mod instrument;
mod knowledge;
mod logging;
mod models;
mod output;
mod providers;
mod repl;

pub use harvest::FileHarvestConfig;
pub use instrument::FileInstrumentConfig;
pub use knowledge::FileKnowledgeConfig;
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use output::FileOutputConfig;
pub use providers::{FileAnthropicConfig, FileOpenAiConfig, FileProvidersConfig, KNOWN_PROVIDERS};
pub use repl::FileReplConfig;

use serde::{Deserialize, Serialize};
use xpcs_domain::{ConfigIssue, ConfigIssueCode, FeasibilityThresholds};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Per-task model selection
    pub models: FileModelsConfig,
    /// LLM provider credentials and routing
    pub providers: FileProvidersConfig,
    /// Instrument profile selection
    pub instrument: FileInstrumentConfig,
    /// Feasibility rule thresholds
    pub feasibility: FeasibilityThresholds,
    /// Knowledge corpus and retrieval
    pub knowledge: FileKnowledgeConfig,
    /// Citation harvesting
    pub harvest: FileHarvestConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Log files
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.models.validate());
        issues.extend(self.providers.validate());
        issues.extend(validate_thresholds(&self.feasibility));
        issues.extend(self.knowledge.validate());
        issues.extend(self.harvest.validate());
        issues
    }
}

fn validate_thresholds(t: &FeasibilityThresholds) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut check = |ok: bool, message: String| {
        if !ok {
            issues.push(ConfigIssue::error(ConfigIssueCode::InvalidThreshold, message));
        }
    };
    check(
        t.frames_per_decay.is_finite() && t.frames_per_decay >= 1.0,
        format!("feasibility.frames_per_decay: {} must be at least 1", t.frames_per_decay),
    );
    check(
        t.min_q_coverage > 0.0 && t.min_q_coverage <= 1.0,
        format!("feasibility.min_q_coverage: {} must be in (0, 1]", t.min_q_coverage),
    );
    check(
        t.dose_warning_duration_s.is_finite() && t.dose_warning_duration_s > 0.0,
        format!(
            "feasibility.dose_warning_duration_s: {} must be positive",
            t.dose_warning_duration_s
        ),
    );
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use xpcs_domain::{Model, OutputFormat};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[models]
default = "claude-sonnet-4.5"
draft = "gpt-5"

[providers]
default = "anthropic"

[instrument]
profile = "profiles/8id-2025.toml"

[feasibility]
frames_per_decay = 20.0

[knowledge]
paths = ["knowledge", "xpcs_publications"]
top_k = 8

[harvest]
output_dir = "papers"
min_delay_secs = 5.0

[output]
format = "json"
color = false

[repl]
show_progress = false
history_file = "~/.local/share/xpcs-hypothesis/history.txt"

[logging]
conversation_log = "transcript.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.models.draft_model(), Model::Gpt5);
        assert_eq!(config.models.chat_model(), Model::ClaudeSonnet45);
        assert_eq!(config.providers.default.as_deref(), Some("anthropic"));
        assert_eq!(
            config.instrument.profile.as_deref(),
            Some(std::path::Path::new("profiles/8id-2025.toml"))
        );
        assert_eq!(config.feasibility.frames_per_decay, 20.0);
        assert_eq!(config.feasibility.min_q_coverage, 0.8);
        assert_eq!(config.knowledge.top_k, 8);
        assert_eq!(config.harvest.output_dir, std::path::PathBuf::from("papers"));
        assert_eq!(config.harvest.max_delay_secs, 20.0);
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.repl.show_progress);
        assert_eq!(config.repl.max_turns, 8);
        assert!(config.logging.conversation_log.is_some());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.models.default.is_none());
        assert!(config.instrument.profile.is_none());
        assert!(config.output.color);
        assert!(config.repl.show_progress);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_invalid_thresholds_reported() {
        let config: FileConfig = toml::from_str(
            r#"
[feasibility]
frames_per_decay = 0.5
min_q_coverage = 1.5
"#,
        )
        .unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.code == ConfigIssueCode::InvalidThreshold));
    }
}

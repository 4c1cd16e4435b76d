//! Citation harvesting configuration from TOML (`[harvest]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use xpcs_application::HarvestPolicy;
use xpcs_domain::{ConfigIssue, ConfigIssueCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHarvestConfig {
    /// Where PDFs, manual notes and batch logs are written.
    pub output_dir: PathBuf,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    /// Semantic Scholar API root.
    pub api_base: String,
    /// Environment variable holding an optional Semantic Scholar API key.
    pub api_key_env: String,
    pub user_agent: String,
    /// Search hits inspected for an open-access PDF.
    pub max_hits: usize,
    /// Pause before retrying a rate-limited search.
    pub rate_limit_cooldown_min_secs: f64,
    pub rate_limit_cooldown_max_secs: f64,
}

impl Default for FileHarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("xpcs_publications"),
            min_delay_secs: 10.0,
            max_delay_secs: 20.0,
            api_base: "https://api.semanticscholar.org".to_string(),
            api_key_env: "SEMANTIC_SCHOLAR_API_KEY".to_string(),
            user_agent: concat!("xpcs-hypothesis/", env!("CARGO_PKG_VERSION")).to_string(),
            max_hits: 5,
            rate_limit_cooldown_min_secs: 30.0,
            rate_limit_cooldown_max_secs: 60.0,
        }
    }
}

impl FileHarvestConfig {
    pub fn policy(&self) -> HarvestPolicy {
        let secs = |s: f64| Duration::from_secs_f64(if s.is_finite() { s.max(0.0) } else { 0.0 });
        HarvestPolicy {
            min_delay: secs(self.min_delay_secs),
            max_delay: secs(self.max_delay_secs),
            max_hits_considered: self.max_hits.max(1),
            cooldown_min: secs(self.rate_limit_cooldown_min_secs),
            cooldown_max: secs(self.rate_limit_cooldown_max_secs),
        }
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.rate_limit_cooldown_min_secs < 0.0 || self.rate_limit_cooldown_max_secs < 0.0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvertedDelay,
                "harvest: rate limit cooldowns cannot be negative",
            ));
        }
        if self.min_delay_secs < 0.0 || self.max_delay_secs < 0.0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvertedDelay,
                "harvest: delays cannot be negative",
            ));
        } else if self.min_delay_secs > self.max_delay_secs {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvertedDelay,
                format!(
                    "harvest: min_delay_secs ({}) is greater than max_delay_secs ({}); the bounds will be swapped",
                    self.min_delay_secs, self.max_delay_secs
                ),
            ));
        }
        issues
    }
}

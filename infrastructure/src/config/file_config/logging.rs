//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of LLM exchanges and harvest records; off when unset.
    pub conversation_log: Option<PathBuf>,
    /// Directory for the daily rolling operational log; off when unset.
    pub log_dir: Option<PathBuf>,
}

//! Instrument configuration from TOML (`[instrument]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInstrumentConfig {
    /// TOML instrument profile; the built-in 8-ID-I profile when unset.
    pub profile: Option<PathBuf>,
}

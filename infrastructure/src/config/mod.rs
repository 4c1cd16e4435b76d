//! Configuration file loading for xpcs-hypothesis
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `XPCS_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./xpcs.toml` or `./.xpcs.toml`
//! 4. Global: `$XDG_CONFIG_HOME/xpcs-hypothesis/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAnthropicConfig, FileConfig, FileHarvestConfig, FileInstrumentConfig,
    FileKnowledgeConfig, FileLoggingConfig, FileModelsConfig, FileOpenAiConfig,
    FileOutputConfig, FileProvidersConfig, FileReplConfig, KNOWN_PROVIDERS,
};
pub use loader::{ConfigLoader, ConfigSource};

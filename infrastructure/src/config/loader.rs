//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["xpcs.toml", ".xpcs.toml"];
const ENV_PREFIX: &str = "XPCS_";

/// One place configuration may come from, as reported by the `config` command.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSource {
    pub label: &'static str,
    pub location: String,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `XPCS_` environment variables, e.g. `XPCS_HARVEST__OUTPUT_DIR`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./xpcs.toml` or `./.xpcs.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/xpcs-hypothesis/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::global_config_path(), Self::project_config_path())
            .extract()
            .map_err(Box::new)
    }

    fn figment(
        explicit: Option<&Path>,
        global: Option<PathBuf>,
        project: Option<PathBuf>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(project_path) = project {
            figment = figment.merge(Toml::file(project_path));
        }

        // An explicit path that does not exist is an error, not a silent skip
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file_exact(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns `$XDG_CONFIG_HOME/xpcs-hypothesis/config.toml` when set,
    /// otherwise the platform config dir.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("xpcs-hypothesis").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Directory for REPL history and other per-user state.
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("xpcs-hypothesis"))
    }

    /// The config sources in priority order, for diagnostics
    pub fn sources(explicit: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();

        if let Some(path) = explicit {
            sources.push(ConfigSource {
                label: "Explicit",
                location: path.display().to_string(),
                found: path.exists(),
            });
        }

        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                label: "Project",
                location: path.display().to_string(),
                found: true,
            },
            None => ConfigSource {
                label: "Project",
                location: "./xpcs.toml or ./.xpcs.toml".to_string(),
                found: false,
            },
        });

        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                found: path.exists(),
                location: path.display().to_string(),
            });
        }

        sources.push(ConfigSource {
            label: "Env",
            location: format!("{ENV_PREFIX}* variables"),
            found: std::env::vars().any(|(k, _)| k.starts_with(ENV_PREFIX)),
        });

        sources.push(ConfigSource {
            label: "Default",
            location: "built-in defaults".to_string(),
            found: true,
        });

        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.models.default.is_none());
        assert_eq!(config.knowledge.top_k, 5);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("xpcs-hypothesis"));
    }

    #[test]
    fn test_project_overrides_global_and_explicit_overrides_both() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_toml(
            &dir,
            "global.toml",
            "[knowledge]\ntop_k = 3\n\n[harvest]\nmax_hits = 2\n\n[repl]\nmax_turns = 4\n",
        );
        let project = write_toml(&dir, "project.toml", "[knowledge]\ntop_k = 7\n\n[repl]\nmax_turns = 6\n");
        let explicit = write_toml(&dir, "explicit.toml", "[repl]\nmax_turns = 12\n");

        let config: FileConfig = ConfigLoader::figment(Some(&explicit), Some(global), Some(project))
            .extract()
            .unwrap();
        assert_eq!(config.harvest.max_hits, 2);
        assert_eq!(config.knowledge.top_k, 7);
        assert_eq!(config.repl.max_turns, 12);
        // Untouched sections keep their defaults
        assert_eq!(config.harvest.min_delay_secs, 10.0);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result: Result<FileConfig, _> = ConfigLoader::figment(Some(&missing), None, None).extract();
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_files() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("xpcs.toml", "[harvest]\noutput_dir = \"from_file\"\n")?;
            jail.set_env("XPCS_HARVEST__OUTPUT_DIR", "from_env");
            let config: FileConfig =
                ConfigLoader::figment(None, None, Some(PathBuf::from("xpcs.toml"))).extract()?;
            assert_eq!(config.harvest.output_dir, PathBuf::from("from_env"));
            Ok(())
        });
    }

    #[test]
    fn test_sources_end_with_defaults() {
        let sources = ConfigLoader::sources(None);
        assert_eq!(sources.last().unwrap().label, "Default");
        assert!(sources.iter().any(|s| s.label == "Project"));
    }
}

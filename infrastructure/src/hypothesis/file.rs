//! TOML hypothesis files read by `evaluate` and written by `draft --save`.

use std::path::{Path, PathBuf};
use thiserror::Error;
use xpcs_domain::{DomainError, Hypothesis};

#[derive(Error, Debug)]
pub enum HypothesisFileError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid hypothesis in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: DomainError,
    },

    #[error("Failed to serialize hypothesis: {0}")]
    Serialize(String),
}

/// Read, validate and normalize a hypothesis; a missing `id` is derived from the title.
pub fn load_hypothesis(path: &Path) -> Result<Hypothesis, HypothesisFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| HypothesisFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let hypothesis: Hypothesis = toml::from_str(&text).map_err(|e| HypothesisFileError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    let hypothesis = hypothesis.normalized();
    hypothesis
        .validate()
        .map_err(|source| HypothesisFileError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(hypothesis)
}

pub fn save_hypothesis(hypothesis: &Hypothesis, path: &Path) -> Result<(), HypothesisFileError> {
    let text = toml::to_string_pretty(hypothesis)
        .map_err(|e| HypothesisFileError::Serialize(e.to_string()))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| HypothesisFileError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| HypothesisFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

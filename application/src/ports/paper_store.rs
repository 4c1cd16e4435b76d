//! Paper store port
//!
//! Persists harvested PDFs, manual-download notes and batch logs.

use std::path::{Path, PathBuf};
use thiserror::Error;
use xpcs_domain::DownloadRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize log: {0}")]
    Serialize(String),
}

pub trait PaperStorePort: Send + Sync {
    fn save_pdf(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StoreError>;

    fn save_manual_note(&self, filename: &str, text: &str) -> Result<PathBuf, StoreError>;

    fn save_log(&self, filename: &str, records: &[DownloadRecord]) -> Result<PathBuf, StoreError>;

    fn output_dir(&self) -> &Path;
}

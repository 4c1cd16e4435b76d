//! [`PaperStorePort`] over a local output directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use xpcs_application::{PaperStorePort, StoreError};
use xpcs_domain::DownloadRecord;

/// Writes PDFs, manual-download notes and batch logs into one directory.
#[derive(Debug, Clone)]
pub struct FsPaperStore {
    output_dir: PathBuf,
}

impl FsPaperStore {
    /// Create the store, creating `output_dir` if it does not exist.
    pub fn create(output_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| StoreError::Io {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.output_dir.join(filename);
        fs::write(&path, bytes).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

impl PaperStorePort for FsPaperStore {
    fn save_pdf(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        self.write(filename, bytes)
    }

    fn save_manual_note(&self, filename: &str, text: &str) -> Result<PathBuf, StoreError> {
        self.write(filename, text.as_bytes())
    }

    fn save_log(&self, filename: &str, records: &[DownloadRecord]) -> Result<PathBuf, StoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.write(filename, json.as_bytes())
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

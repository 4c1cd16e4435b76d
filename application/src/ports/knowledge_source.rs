//! Knowledge source port
//!
//! Supplies the documents (textbooks, data handbook, citations) the
//! retrieval index is built from.

use thiserror::Error;
use xpcs_domain::Document;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid knowledge path pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

/// Port for loading the knowledge corpus
pub trait KnowledgeSourcePort: Send + Sync {
    /// Load every readable document.
    ///
    /// Unreadable individual files are skipped by implementations; only
    /// failures that make the whole source unusable are errors.
    fn load_documents(&self) -> Result<Vec<Document>, KnowledgeError>;
}

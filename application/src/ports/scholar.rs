//! Scholarly search port
//!
//! Finds open-access PDFs for citations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScholarError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Rate limited by the search service")]
    RateLimited,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Download exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Timeout")]
    Timeout,
}

/// A search result from the scholarly backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperHit {
    pub title: String,
    pub year: Option<u16>,
    pub authors: Vec<String>,
    pub pdf_url: Option<String>,
    /// Page a human can open to fetch the paper manually.
    pub landing_url: Option<String>,
}

#[async_trait]
pub trait ScholarSearchPort: Send + Sync {
    /// Search by free text, best matches first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperHit>, ScholarError>;

    /// Fetch the raw bytes behind a PDF link.
    async fn download_pdf(&self, url: &str) -> Result<Vec<u8>, ScholarError>;

    /// Browser URL for searching `query` by hand.
    fn manual_search_url(&self, query: &str) -> String;
}

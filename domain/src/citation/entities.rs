//! Reference strings and the download bookkeeping built around them.

use crate::core::error::DomainError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year pattern is valid"));

/// A bibliographic reference in the `Author X. YEAR. Title. Journal` style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub raw: String,
    pub first_author: String,
    pub year: Option<String>,
    pub title: Option<String>,
}

impl Citation {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::InvalidCitation("citation is empty".into()));
        }

        let first_author: String = raw.chars().take_while(|c| c.is_alphabetic()).collect();
        let year_match = YEAR.find(raw);
        let year = year_match.map(|m| m.as_str().to_string());
        let title = year_match.and_then(|m| extract_title(&raw[m.end()..]));

        Ok(Self {
            raw: raw.to_string(),
            first_author,
            year,
            title,
        })
    }

    /// Text sent to the scholarly search backend.
    pub fn search_query(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.raw)
    }

    /// `{index:03}_{author}_{year}.pdf`; missing parts are left empty.
    ///
    /// The author keeps non-ASCII letters (`Grübel` stays `Grübel`), so these
    /// names do not line up with folders whose files cut the author at the
    /// first non-ASCII letter (`002_Gr_2008.pdf`).
    pub fn pdf_filename(&self, index: usize) -> String {
        format!(
            "{index:03}_{}_{}.pdf",
            self.first_author,
            self.year.as_deref().unwrap_or("")
        )
    }

    pub fn manual_note_filename(index: usize) -> String {
        format!("{index:03}_manual_download.txt")
    }

    /// Body of the note left behind when a PDF must be fetched by hand.
    pub fn manual_note(&self, url: &str) -> String {
        format!(
            "Citation: {}\n\nSearch URL: {url}\n\nThis paper needs to be downloaded manually.\n",
            self.raw
        )
    }
}

/// Sentence following `YEAR. `, ended by `. ` or `? `.
fn extract_title(after_year: &str) -> Option<String> {
    let rest = after_year.strip_prefix(". ")?;
    let end = [rest.find(". "), rest.find("? ").map(|i| i + 1)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    let title = rest[..end].trim().trim_end_matches('.').trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Outcome of one harvest attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    /// PDF saved.
    Success,
    /// Search worked but no usable PDF; a manual note was written.
    Failed,
    /// The search itself errored.
    Error,
}

/// One entry of the batch download log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub status: DownloadStatus,
    pub citation: String,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl DownloadRecord {
    pub fn success(citation: &Citation, index: usize, file: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Success,
            citation: citation.raw.clone(),
            index,
            reason: None,
            error: None,
            file: Some(file.into()),
        }
    }

    pub fn failed(
        citation: &Citation,
        index: usize,
        reason: impl Into<String>,
        note_file: Option<String>,
    ) -> Self {
        Self {
            status: DownloadStatus::Failed,
            citation: citation.raw.clone(),
            index,
            reason: Some(reason.into()),
            error: None,
            file: note_file,
        }
    }

    pub fn error(citation: &Citation, index: usize, error: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Error,
            citation: citation.raw.clone(),
            index,
            reason: None,
            error: Some(error.into()),
            file: None,
        }
    }
}

/// `download_log_batch_{start}_{timestamp}.json`, timestamp as `YYYYmmdd_HHMMSS`.
pub fn batch_log_filename(start_index: usize, timestamp: &str) -> String {
    format!("download_log_batch_{start_index}_{timestamp}.json")
}

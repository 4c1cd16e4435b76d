//! Knowledge corpus configuration from TOML (`[knowledge]` section)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use xpcs_domain::{ChunkingConfig, ConfigIssue, ConfigIssueCode, SourceKind};

/// Where the corpus lives and how it is chunked.
///
/// # Example
///
/// ```toml
/// [knowledge]
/// paths = ["knowledge", "~/papers/xpcs_publications"]
/// top_k = 6
///
/// [knowledge.kind_hints]
/// "8id_manual" = "handbook"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKnowledgeConfig {
    /// Directories or files to index.
    pub paths: Vec<PathBuf>,
    /// File extensions read as text.
    pub extensions: Vec<String>,
    pub max_chunk_chars: usize,
    pub overlap_paragraphs: usize,
    /// Passages retrieved per question.
    pub top_k: usize,
    /// Directory name → source kind, checked before the built-in names.
    pub kind_hints: BTreeMap<String, SourceKind>,
}

impl Default for FileKnowledgeConfig {
    fn default() -> Self {
        let chunking = ChunkingConfig::default();
        Self {
            paths: vec![PathBuf::from("knowledge")],
            extensions: vec!["md".into(), "txt".into(), "markdown".into()],
            max_chunk_chars: chunking.max_chars,
            overlap_paragraphs: chunking.overlap_paragraphs,
            top_k: 5,
            kind_hints: BTreeMap::new(),
        }
    }
}

impl FileKnowledgeConfig {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig {
            max_chars: self.max_chunk_chars,
            overlap_paragraphs: self.overlap_paragraphs,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.top_k == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTopK,
                "knowledge.top_k: must be at least 1",
            ));
        }
        if self.max_chunk_chars < 100 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidChunking,
                format!(
                    "knowledge.max_chunk_chars: {} is too small (minimum 100)",
                    self.max_chunk_chars
                ),
            ));
        }
        if self.overlap_paragraphs > 3 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidChunking,
                format!(
                    "knowledge.overlap_paragraphs: {} repeats most of every chunk",
                    self.overlap_paragraphs
                ),
            ));
        }
        issues
    }
}

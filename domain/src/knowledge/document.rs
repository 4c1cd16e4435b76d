//! Corpus documents and the chunks they are split into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a document comes from in the XPCS corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Textbook,
    Handbook,
    Citation,
    #[default]
    Note,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Textbook => "textbook",
            SourceKind::Handbook => "handbook",
            SourceKind::Citation => "citation",
            SourceKind::Note => "note",
        }
    }

    /// Guess the kind from a directory name such as `textbooks/` or `handbook`.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.starts_with("textbook") || name == "books" {
            Some(SourceKind::Textbook)
        } else if name.starts_with("handbook") || name == "manual" || name == "docs" {
            Some(SourceKind::Handbook)
        } else if name.starts_with("citation")
            || name.starts_with("publication")
            || name.starts_with("paper")
            || name.ends_with("_publications")
        {
            Some(SourceKind::Citation)
        } else if name.starts_with("note") {
            Some(SourceKind::Note)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "textbook" | "textbooks" | "book" => Ok(SourceKind::Textbook),
            "handbook" | "data handbook" | "manual" => Ok(SourceKind::Handbook),
            "citation" | "citations" | "paper" | "papers" => Ok(SourceKind::Citation),
            "note" | "notes" => Ok(SourceKind::Note),
            other => Err(format!("unknown source kind '{other}'")),
        }
    }
}

/// A loaded text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub text: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: SourceKind,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            path: None,
            text: text.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Retrieval unit: a run of paragraphs from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub ordinal: usize,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_dir_name() {
        assert_eq!(SourceKind::from_dir_name("Textbooks"), Some(SourceKind::Textbook));
        assert_eq!(SourceKind::from_dir_name("handbook"), Some(SourceKind::Handbook));
        assert_eq!(SourceKind::from_dir_name("xpcs_publications"), Some(SourceKind::Citation));
        assert_eq!(SourceKind::from_dir_name("misc"), None);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Citations".parse::<SourceKind>().unwrap(), SourceKind::Citation);
        assert!("video".parse::<SourceKind>().is_err());
    }
}

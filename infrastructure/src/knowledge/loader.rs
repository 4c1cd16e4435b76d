//! Local file system knowledge loader
//!
//! Walks the configured paths and turns every readable text file into a
//! [`Document`]. The source kind comes from the nearest directory whose name
//! is a kind hint (`textbooks/`, `handbook/`, `citations/` ...). PDFs are not
//! read; a `.txt` sidecar with the same stem is loaded in their place.

use crate::config::FileKnowledgeConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use xpcs_application::{KnowledgeError, KnowledgeSourcePort};
use xpcs_domain::{Document, SourceKind};

#[derive(Debug, Clone)]
pub struct LocalKnowledgeLoader {
    paths: Vec<PathBuf>,
    extensions: Vec<String>,
    kind_hints: BTreeMap<String, SourceKind>,
}

impl LocalKnowledgeLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            extensions: vec!["md".into(), "txt".into(), "markdown".into()],
            kind_hints: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &FileKnowledgeConfig) -> Self {
        Self {
            paths: config.paths.clone(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            kind_hints: config
                .kind_hints
                .iter()
                .map(|(dir, kind)| (dir.to_lowercase(), *kind))
                .collect(),
        }
    }

    pub fn with_kind_hint(mut self, dir_name: &str, kind: SourceKind) -> Self {
        self.kind_hints.insert(dir_name.to_lowercase(), kind);
        self
    }

    /// Expand one configured entry into candidate files.
    fn expand(&self, entry: &Path) -> Result<Vec<PathBuf>, KnowledgeError> {
        let raw = entry.to_string_lossy();
        let pattern = if raw.contains(['*', '?', '[']) {
            raw.into_owned()
        } else if entry.is_dir() {
            format!("{}/**/*", glob::Pattern::escape(&raw))
        } else if entry.is_file() {
            return Ok(vec![entry.to_path_buf()]);
        } else {
            debug!("Knowledge path does not exist: {}", entry.display());
            return Ok(Vec::new());
        };

        let paths = glob::glob(&pattern).map_err(|e| KnowledgeError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        Ok(paths
            .filter_map(|p| match p {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    None
                }
            })
            .filter(|p| p.is_file())
            .collect())
    }

    fn has_text_extension(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Kind from the nearest ancestor directory that names one.
    fn kind_for(&self, path: &Path) -> SourceKind {
        path.ancestors()
            .skip(1)
            .filter_map(|dir| dir.file_name()?.to_str())
            .find_map(|name| {
                self.kind_hints
                    .get(&name.to_lowercase())
                    .copied()
                    .or_else(|| SourceKind::from_dir_name(name))
            })
            .unwrap_or_default()
    }

    fn load_file(&self, path: &Path) -> Option<Document> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };
        if text.trim().is_empty() {
            debug!("Skipping empty file: {}", path.display());
            return None;
        }

        let title = markdown_title(&text).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().replace('_', " "))
                .unwrap_or_else(|| path.display().to_string())
        });
        let id = path.display().to_string();
        debug!("Loaded knowledge file: {}", id);
        Some(Document::new(id.clone(), title, self.kind_for(path), text).with_path(id))
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Text of the first `# ` heading.
fn markdown_title(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

impl KnowledgeSourcePort for LocalKnowledgeLoader {
    fn load_documents(&self) -> Result<Vec<Document>, KnowledgeError> {
        let mut files = BTreeSet::new();
        for entry in &self.paths {
            files.extend(self.expand(entry)?);
        }

        let mut documents = Vec::new();
        let mut pdfs_without_text = 0usize;
        for path in &files {
            if self.has_text_extension(path) {
                documents.extend(self.load_file(path));
            } else if extension(path).as_deref() == Some("pdf") {
                let sidecar = path.with_extension("txt");
                if !sidecar.is_file() {
                    pdfs_without_text += 1;
                    warn!(
                        "Cannot index PDF {}; add a text export at {} to include it",
                        path.display(),
                        sidecar.display()
                    );
                }
            }
        }

        debug!(
            "Loaded {} knowledge documents from {} file(s); {} PDF(s) without text",
            documents.len(),
            files.len(),
            pdfs_without_text
        );
        Ok(documents)
    }
}

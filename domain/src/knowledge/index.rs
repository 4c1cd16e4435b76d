//! In-memory inverted index with BM25 ranking.

use super::chunking::{ChunkingConfig, chunk_document};
use super::document::{Chunk, Document, SourceKind};
use super::tokenize::tokenize;
use crate::core::error::DomainError;
use crate::core::string::truncate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

const K1: f64 = 1.2;
const B: f64 = 0.75;

#[derive(Debug, Clone)]
struct DocumentMeta {
    title: String,
    kind: SourceKind,
    path: Option<String>,
}

/// A retrieved chunk with its BM25 score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub document_title: String,
    pub kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub vocabulary: usize,
}

/// Lexical retrieval index over the knowledge corpus.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeIndex {
    documents: HashMap<String, DocumentMeta>,
    chunks: Vec<Chunk>,
    chunk_lengths: Vec<usize>,
    /// term -> (chunk index, term frequency)
    postings: HashMap<String, Vec<(usize, u32)>>,
    avg_chunk_len: f64,
}

impl KnowledgeIndex {
    pub fn build(documents: Vec<Document>, config: &ChunkingConfig) -> Self {
        let mut index = KnowledgeIndex::default();

        for document in documents {
            for chunk in chunk_document(&document, config) {
                let tokens = tokenize(&chunk.text);
                let chunk_idx = index.chunks.len();

                let mut frequencies: HashMap<String, u32> = HashMap::new();
                for token in &tokens {
                    *frequencies.entry(token.clone()).or_default() += 1;
                }
                for (term, tf) in frequencies {
                    index.postings.entry(term).or_default().push((chunk_idx, tf));
                }

                index.chunk_lengths.push(tokens.len());
                index.chunks.push(chunk);
            }
            index.documents.insert(
                document.id,
                DocumentMeta {
                    title: document.title,
                    kind: document.kind,
                    path: document.path,
                },
            );
        }

        let total: usize = index.chunk_lengths.iter().sum();
        index.avg_chunk_len = if index.chunks.is_empty() {
            0.0
        } else {
            total as f64 / index.chunks.len() as f64
        };
        index
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.documents.len(),
            chunks: self.chunks.len(),
            vocabulary: self.postings.len(),
        }
    }

    /// Rank chunks for `query`, best first.
    ///
    /// Ties are broken by `(doc_id, ordinal)`; zero-score chunks are dropped.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, DomainError> {
        let terms: HashSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return Err(DomainError::EmptyQuery);
        }

        let n = self.chunks.len() as f64;
        let mut scores: HashMap<usize, f64> = HashMap::new();
        for term in &terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let df = postings.len() as f64;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            for &(chunk_idx, tf) in postings {
                let tf = tf as f64;
                let len_norm = if self.avg_chunk_len > 0.0 {
                    self.chunk_lengths[chunk_idx] as f64 / self.avg_chunk_len
                } else {
                    1.0
                };
                let score = idf * (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * len_norm));
                *scores.entry(chunk_idx).or_default() += score;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
        ranked.sort_by(|(a_idx, a_score), (b_idx, b_score)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    let (a, b) = (&self.chunks[*a_idx], &self.chunks[*b_idx]);
                    a.doc_id.cmp(&b.doc_id).then(a.ordinal.cmp(&b.ordinal))
                })
        });
        ranked.truncate(top_k);

        Ok(ranked
            .into_iter()
            .map(|(idx, score)| {
                let chunk = self.chunks[idx].clone();
                let meta = self.documents.get(&chunk.doc_id);
                ScoredChunk {
                    document_title: meta.map(|m| m.title.clone()).unwrap_or_else(|| chunk.doc_id.clone()),
                    kind: meta.map(|m| m.kind).unwrap_or_default(),
                    path: meta.and_then(|m| m.path.clone()),
                    chunk,
                    score,
                }
            })
            .collect())
    }
}

/// Render hits as a numbered source block for prompts, capped at `max_chars`
/// characters (not bytes, so non-ASCII sources get the same room as chunks).
///
/// The first source is always included, truncated if necessary.
pub fn format_context(hits: &[ScoredChunk], max_chars: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for (i, hit) in hits.iter().enumerate() {
        let header = format!("[{}] {} ({})\n", i + 1, hit.document_title, hit.kind);
        let entry = format!("{header}{}\n\n", hit.chunk.text);
        let entry_chars = entry.chars().count();
        if used + entry_chars > max_chars {
            if out.is_empty() {
                let room = max_chars.saturating_sub(header.chars().count());
                out.push_str(&header);
                out.push_str(&truncate_chars(&hit.chunk.text, room));
                out.push('\n');
            }
            break;
        }
        out.push_str(&entry);
        used += entry_chars;
    }
    out.trim_end().to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new(
                "sutton",
                "X-ray intensity fluctuation spectroscopy review",
                SourceKind::Citation,
                "Speckle visibility depends on the coherent fraction of the beam.\n\n\
                 The intensity autocorrelation g2 decays with the relaxation time of the sample.",
            ),
            Document::new(
                "handbook",
                "8-ID-I data handbook",
                SourceKind::Handbook,
                "The Rigaku detector reaches microsecond frame times.\n\n\
                 Two-time correlation functions reveal aging in glasses.",
            ),
            Document::new(
                "textbook",
                "Elements of Modern X-ray Physics",
                SourceKind::Textbook,
                "Small-angle scattering probes length scales of nanometres to microns.",
            ),
        ]
    }

    fn index() -> KnowledgeIndex {
        KnowledgeIndex::build(corpus(), &ChunkingConfig { max_chars: 90, overlap_paragraphs: 0 })
    }

    #[test]
    fn test_stats() {
        let stats = index().stats();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.chunks, 5);
        assert!(stats.vocabulary > 20);
    }

    #[test]
    fn test_search_ranks_relevant_chunk_first() {
        let hits = index().search("aging two-time correlation", 3).unwrap();
        assert_eq!(hits[0].chunk.doc_id, "handbook");
        assert_eq!(hits[0].chunk.ordinal, 1);
        assert_eq!(hits[0].kind, SourceKind::Handbook);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_excludes_zero_scores() {
        let hits = index().search("speckle", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_title, "X-ray intensity fluctuation spectroscopy review");
        assert!(index().search("rheology", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_respects_top_k() {
        assert_eq!(index().search("the detector sample beam scattering", 2).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(index().search("   ", 5).unwrap_err(), DomainError::EmptyQuery);
        assert_eq!(index().search("the of a", 5).unwrap_err(), DomainError::EmptyQuery);
    }

    #[test]
    fn test_ties_break_by_doc_then_ordinal() {
        let docs = vec![
            Document::new("b", "B", SourceKind::Note, "coherence"),
            Document::new("a", "A", SourceKind::Note, "coherence"),
        ];
        let index = KnowledgeIndex::build(docs, &ChunkingConfig::default());
        let hits = index.search("coherence", 5).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_index() {
        let index = KnowledgeIndex::build(vec![], &ChunkingConfig::default());
        assert!(index.is_empty());
        assert!(index.search("speckle", 5).unwrap().is_empty());
    }

    #[test]
    fn test_format_context_numbers_sources() {
        let hits = index().search("detector frame", 2).unwrap();
        let context = format_context(&hits, 10_000);
        assert!(context.starts_with("[1] 8-ID-I data handbook (handbook)\n"));
    }

    #[test]
    fn test_format_context_truncates_first_source() {
        let hits = index().search("speckle", 1).unwrap();
        let context = format_context(&hits, 100);
        assert!(context.chars().count() <= 100);
        assert!(context.ends_with("..."));
    }

    #[test]
    fn test_format_context_budget_counts_characters() {
        let text = "Grübel measured q = 0.02 Å⁻¹ with τ ≈ 1 µs in the Ångström regime. ".repeat(3);
        let index = KnowledgeIndex::build(
            vec![Document::new("grubel", "Grübel 2008", SourceKind::Citation, &text)],
            &ChunkingConfig::default(),
        );
        let hits = index.search("Grübel", 1).unwrap();
        let full = format!("[1] Grübel 2008 (citation)\n{}\n\n", hits[0].chunk.text);
        let budget = full.chars().count();
        assert!(full.len() > budget);

        // Exactly enough characters for the whole entry, though fewer than its bytes
        let context = format_context(&hits, budget);
        assert!(!context.ends_with("..."));
        assert_eq!(context, full.trim_end());
    }
}

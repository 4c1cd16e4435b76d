//! Paragraph-packing chunker.

use super::document::{Chunk, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    /// Paragraphs repeated at the start of the next chunk.
    pub overlap_paragraphs: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            overlap_paragraphs: 1,
        }
    }
}

/// Split a document into chunks of at most `max_chars` characters.
///
/// Paragraphs are blank-line separated and packed greedily. Oversized
/// paragraphs are split on sentence ends, then hard-cut.
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Vec<Chunk> {
    let max_chars = config.max_chars.max(1);
    let pieces: Vec<String> = paragraphs(&document.text)
        .into_iter()
        .flat_map(|p| split_long(&p, max_chars))
        .collect();

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for piece in &pieces {
        let piece_len = piece.chars().count();
        let joined_len = if current.is_empty() {
            piece_len
        } else {
            current_len + 2 + piece_len
        };

        if joined_len > max_chars && !current.is_empty() {
            chunks.push(current.join("\n\n"));

            // Carry the overlap only if it leaves room for the new piece
            let keep = config.overlap_paragraphs.min(current.len());
            let mut carried: Vec<&str> = current[current.len() - keep..].to_vec();
            let mut carried_len = joined_chars(&carried);
            while !carried.is_empty() && carried_len + 2 + piece_len > max_chars {
                carried.remove(0);
                carried_len = joined_chars(&carried);
            }
            current = carried;
            current_len = carried_len;
        }

        current_len = if current.is_empty() {
            piece_len
        } else {
            current_len + 2 + piece_len
        };
        current.push(piece);
    }
    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Chunk {
            doc_id: document.id.clone(),
            ordinal,
            text,
        })
        .collect()
}

fn joined_chars(parts: &[&str]) -> usize {
    if parts.is_empty() {
        return 0;
    }
    parts.iter().map(|p| p.chars().count()).sum::<usize>() + 2 * (parts.len() - 1)
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

fn split_long(paragraph: &str, max_chars: usize) -> Vec<String> {
    if paragraph.chars().count() <= max_chars {
        return vec![paragraph.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    for sentence in sentences(paragraph) {
        let candidate_len = if current.is_empty() {
            sentence.chars().count()
        } else {
            current.chars().count() + 1 + sentence.chars().count()
        };
        if candidate_len <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            continue;
        }
        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if sentence.chars().count() <= max_chars {
            current.push_str(sentence);
        } else {
            out.extend(hard_cut(sentence, max_chars));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?')
            && let Some(&(next_i, next)) = iter.peek()
            && next.is_whitespace()
        {
            let sentence = text[start..i + c.len_utf8()].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = next_i;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn hard_cut(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::document::SourceKind;

    fn doc(text: &str) -> Document {
        Document::new("d", "D", SourceKind::Textbook, text)
    }

    fn config(max_chars: usize, overlap_paragraphs: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_chars,
            overlap_paragraphs,
        }
    }

    #[test]
    fn test_empty_document_has_no_chunks() {
        assert!(chunk_document(&doc(""), &ChunkingConfig::default()).is_empty());
        assert!(chunk_document(&doc("\n\n  \n"), &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_small_document_is_one_chunk() {
        let chunks = chunk_document(&doc("alpha\nbeta\n\ngamma"), &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha beta\n\ngamma");
        assert_eq!(chunks[0].ordinal, 0);
    }

    #[test]
    fn test_packing_with_overlap() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        // "aaaa\n\nbbbb" is 10 chars
        let chunks = chunk_document(&doc(text), &config(10, 1));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa\n\nbbbb", "bbbb\n\ncccc"]);
    }

    #[test]
    fn test_packing_without_overlap() {
        let chunks = chunk_document(&doc("aaaa\n\nbbbb\n\ncccc"), &config(10, 0));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn test_long_paragraph_splits_on_sentences() {
        let text = "First sentence here. Second one follows. Third closes it.";
        let chunks = chunk_document(&doc(text), &config(25, 0));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["First sentence here.", "Second one follows.", "Third closes it."]
        );
    }

    #[test]
    fn test_hard_cut_fallback() {
        let chunks = chunk_document(&doc(&"x".repeat(25)), &config(10, 0));
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 10));
    }

    #[test]
    fn test_chunks_never_exceed_limit() {
        let text = (0..40)
            .map(|i| format!("Paragraph {i} talks about speckle contrast and g2 decay."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_document(&doc(&text), &config(200, 1));
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 200));
        assert!(chunks.iter().enumerate().all(|(i, c)| c.ordinal == i));
    }
}

//! Knowledge corpus retrieval: textbooks, the data handbook and citations.

pub mod chunking;
pub mod document;
pub mod index;
pub mod tokenize;

pub use chunking::{ChunkingConfig, chunk_document};
pub use document::{Chunk, Document, SourceKind};
pub use index::{IndexStats, KnowledgeIndex, ScoredChunk, format_context};
pub use tokenize::tokenize;

//! Scholarly search adapters

mod semantic_scholar;

pub use semantic_scholar::{MAX_PDF_BYTES, SemanticScholarClient};

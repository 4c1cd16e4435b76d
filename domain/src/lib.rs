//! Domain layer for xpcs-hypothesis
//!
//! This crate contains the core logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Hypothesis and instrument
//!
//! - **Hypothesis**: a testable XPCS experiment claim with the q-range,
//!   timescale and sample conditions it needs
//! - **InstrumentProfile**: what a beamline endstation declares it can do
//!   (8-ID-I by default)
//!
//! ## Feasibility
//!
//! A deterministic rule evaluator compares the two and emits one finding per
//! check. Rules never depend on an LLM.
//!
//! ## Knowledge
//!
//! Textbooks, the data handbook and citations are chunked and ranked with
//! BM25 to ground drafts and answers.

pub mod citation;
pub mod config;
pub mod conversation;
pub mod core;
pub mod feasibility;
pub mod hypothesis;
pub mod instrument;
pub mod knowledge;
pub mod prompt;

// Re-export commonly used types
pub use citation::{
    BatchRange, Citation, DownloadRecord, DownloadStatus, batch_log_filename, parse_citation_list,
    select_batch,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use conversation::{Conversation, Message, Role};
pub use core::{
    error::DomainError,
    model::Model,
    string::{slugify, truncate},
};
pub use feasibility::{
    CheckKind, FeasibilityEvaluator, FeasibilityReport, FeasibilityThresholds, Finding, Overall,
    Verdict,
};
pub use hypothesis::{
    Geometry, Hypothesis, HypothesisBuilder, SampleClass, SampleSpec, Span, parse_hypothesis_json,
};
pub use instrument::{Detector, GeometryCapability, InstrumentProfile, SampleEnvironment};
pub use knowledge::{
    Chunk, ChunkingConfig, Document, IndexStats, KnowledgeIndex, ScoredChunk, SourceKind,
    format_context,
};
pub use prompt::PromptTemplate;

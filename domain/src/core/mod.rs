//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: LLM models used for drafting, narratives and chat
//! - [`error::DomainError`]: domain-level errors
//! - [`string::truncate`]: UTF-8 safe preview truncation

pub mod error;
pub mod model;
pub mod string;

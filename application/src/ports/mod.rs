//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod harvest_progress;
pub mod knowledge_source;
pub mod llm_gateway;
pub mod paper_store;
pub mod scholar;

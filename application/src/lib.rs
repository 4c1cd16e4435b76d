//! Application layer for xpcs-hypothesis
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{BehaviorConfig, HarvestPolicy};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    harvest_progress::{HarvestProgress, NoHarvestProgress},
    knowledge_source::{KnowledgeError, KnowledgeSourcePort},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    paper_store::{PaperStorePort, StoreError},
    scholar::{PaperHit, ScholarError, ScholarSearchPort},
};
pub use use_cases::ask::{AskError, AskInput, AskOutput, AskUseCase};
pub use use_cases::build_knowledge_index::BuildKnowledgeIndexUseCase;
pub use use_cases::draft_hypothesis::{
    DraftError, DraftHypothesisUseCase, DraftInput, DraftOutput,
};
pub use use_cases::evaluate_feasibility::{
    EvaluateError, EvaluateFeasibilityUseCase, EvaluateInput, EvaluateOutput, NarrativeRequest,
};
pub use use_cases::harvest_citations::{
    HarvestCitationsUseCase, HarvestError, HarvestInput, HarvestSummary,
};

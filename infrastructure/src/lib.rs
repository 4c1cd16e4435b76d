//! Infrastructure layer for xpcs-hypothesis
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod hypothesis;
pub mod instrument;
pub mod knowledge;
pub mod logging;
pub mod providers;
pub mod scholar;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigSource, FileConfig};
pub use hypothesis::{HypothesisFileError, load_hypothesis, save_hypothesis};
pub use instrument::{InstrumentLoadError, load_instrument_profile};
pub use knowledge::LocalKnowledgeLoader;
pub use logging::JsonlConversationLogger;
pub use providers::{
    AnthropicProvider, OpenAiCompatibleProvider, ProviderAdapter, ProviderKind, RetryPolicy,
    RoutingGateway,
};
pub use scholar::SemanticScholarClient;
pub use storage::FsPaperStore;

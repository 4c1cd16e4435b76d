//! Transcript logging
//!
//! Provides [`JsonlConversationLogger`], a JSONL file writer that implements
//! the [`ConversationLogger`](xpcs_application::ConversationLogger) port.
//! Operational logs go through `tracing` and are configured by the binary.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;

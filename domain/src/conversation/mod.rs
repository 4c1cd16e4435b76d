//! Chat history shared between the REPL and the ask use case.

pub mod entities;

pub use entities::{Conversation, Message, Role};

//! Interactive chat module
//!
//! A readline-based chat that answers from the knowledge base and can
//! draft, evaluate and search without leaving the session.

mod repl;

pub use repl::{ChatRepl, HypothesisLoader, ReplCommand};

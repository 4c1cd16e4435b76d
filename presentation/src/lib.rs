//! Presentation layer for xpcs-hypothesis
//!
//! This crate contains CLI definitions, output formatters,
//! harvest progress reporters, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, HypothesisLoader};
pub use cli::commands::{Cli, Command, OutputArg};
pub use output::console::{ConsoleFormatter, SourceLine};
pub use progress::reporter::{HarvestProgressReporter, SimpleHarvestProgress};

//! Output formatting for command results

pub mod console;

pub use console::{ConsoleFormatter, SourceLine};

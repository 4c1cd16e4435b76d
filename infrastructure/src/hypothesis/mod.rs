//! Hypothesis files

mod file;

pub use file::{HypothesisFileError, load_hypothesis, save_hypothesis};

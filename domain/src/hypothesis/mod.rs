//! Experiment hypotheses: what a user wants to measure, in machine-checkable form.

pub mod entities;
pub mod parsing;
pub mod span;

pub use entities::{Geometry, Hypothesis, HypothesisBuilder, SampleClass, SampleSpec};
pub use parsing::{extract_json_object, parse_hypothesis_json};
pub use span::{Span, format_number};

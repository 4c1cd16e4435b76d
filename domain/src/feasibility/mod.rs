//! Feasibility rules: does the instrument support what the hypothesis needs?

pub mod evaluator;
pub mod report;
pub mod rule;

pub use evaluator::FeasibilityEvaluator;
pub use report::{FeasibilityReport, Overall};
pub use rule::{CheckKind, FeasibilityThresholds, Finding, Verdict};

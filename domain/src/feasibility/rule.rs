//! Check kinds, verdicts and the thresholds rules are evaluated against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One aspect of an experiment the evaluator checks.
///
/// Declaration order is the order findings appear in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Energy,
    Geometry,
    QRange,
    FastestTimescale,
    SlowestTimescale,
    Temperature,
    Environment,
    RadiationDose,
}

impl CheckKind {
    pub const ALL: [CheckKind; 8] = [
        CheckKind::Energy,
        CheckKind::Geometry,
        CheckKind::QRange,
        CheckKind::FastestTimescale,
        CheckKind::SlowestTimescale,
        CheckKind::Temperature,
        CheckKind::Environment,
        CheckKind::RadiationDose,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Energy => "energy",
            CheckKind::Geometry => "geometry",
            CheckKind::QRange => "q-range",
            CheckKind::FastestTimescale => "fastest timescale",
            CheckKind::SlowestTimescale => "slowest timescale",
            CheckKind::Temperature => "temperature",
            CheckKind::Environment => "environment",
            CheckKind::RadiationDose => "radiation dose",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Outcome of a single check, ordered by severity (`Fail` is the worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    NotApplicable,
    Pass,
    Marginal,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::NotApplicable => "n/a",
            Verdict::Pass => "pass",
            Verdict::Marginal => "marginal",
            Verdict::Fail => "fail",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict of one check with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub check: CheckKind,
    pub verdict: Verdict,
    pub message: String,
}

impl Finding {
    pub fn new(check: CheckKind, verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            check,
            verdict,
            message: message.into(),
        }
    }
}

/// Tunable limits used by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityThresholds {
    /// Detector frames needed within the fastest relaxation time.
    pub frames_per_decay: f64,
    /// Smallest q-coverage fraction still accepted as marginal.
    pub min_q_coverage: f64,
    /// Slowest timescale above which sensitive samples get a dose warning.
    pub dose_warning_duration_s: f64,
}

impl Default for FeasibilityThresholds {
    fn default() -> Self {
        Self {
            frames_per_decay: 10.0,
            min_q_coverage: 0.8,
            dose_warning_duration_s: 600.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_severity_order() {
        assert!(Verdict::Fail > Verdict::Marginal);
        assert!(Verdict::Marginal > Verdict::Pass);
        assert!(Verdict::Pass > Verdict::NotApplicable);
    }

    #[test]
    fn test_thresholds_partial_deserialize() {
        let t: FeasibilityThresholds = toml::from_str("frames_per_decay = 20.0").unwrap();
        assert_eq!(t.frames_per_decay, 20.0);
        assert_eq!(t.min_q_coverage, 0.8);
    }

    #[test]
    fn test_check_kind_serializes_snake_case() {
        let json = serde_json::to_string(&CheckKind::FastestTimescale).unwrap();
        assert_eq!(json, "\"fastest_timescale\"");
    }
}

//! Aggregated evaluation result.

use super::rule::{CheckKind, Finding, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall judgement derived from the worst finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overall {
    Feasible,
    Conditional,
    Infeasible,
}

impl Overall {
    pub fn from_findings(findings: &[Finding]) -> Self {
        match findings.iter().map(|f| f.verdict).max() {
            Some(Verdict::Fail) => Overall::Infeasible,
            Some(Verdict::Marginal) => Overall::Conditional,
            _ => Overall::Feasible,
        }
    }
}

impl fmt::Display for Overall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Overall::Feasible => "feasible",
            Overall::Conditional => "conditionally feasible",
            Overall::Infeasible => "infeasible",
        };
        write!(f, "{s}")
    }
}

/// Result of checking one hypothesis against one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub hypothesis_id: String,
    pub instrument: String,
    pub findings: Vec<Finding>,
    pub overall: Overall,
}

impl FeasibilityReport {
    pub fn new(
        hypothesis_id: impl Into<String>,
        instrument: impl Into<String>,
        findings: Vec<Finding>,
    ) -> Self {
        let overall = Overall::from_findings(&findings);
        Self {
            hypothesis_id: hypothesis_id.into(),
            instrument: instrument.into(),
            findings,
            overall,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.verdict == Verdict::Fail)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.verdict == Verdict::Marginal)
    }

    /// True unless some check failed; conditional results count as feasible.
    pub fn is_feasible(&self) -> bool {
        self.overall != Overall::Infeasible
    }

    pub fn finding(&self, check: CheckKind) -> Option<&Finding> {
        self.findings.iter().find(|f| f.check == check)
    }

    /// Plain-text rendering used inside prompts.
    pub fn to_prompt_text(&self) -> String {
        let mut out = format!(
            "Feasibility of '{}' on {}: {}\n",
            self.hypothesis_id, self.instrument, self.overall
        );
        for finding in &self.findings {
            out.push_str(&format!(
                "- {} [{}]: {}\n",
                finding.check, finding.verdict, finding.message
            ));
        }
        out
    }
}

//! Console output formatter for command results

use colored::{ColoredString, Colorize};
use serde_json::{Value, json};
use xpcs_application::{AskOutput, DraftOutput, EvaluateOutput, HarvestSummary};
use xpcs_domain::hypothesis::format_number;
use xpcs_domain::{
    ConfigIssue, DownloadStatus, FeasibilityReport, Hypothesis, InstrumentProfile, Overall,
    ScoredChunk, Severity, Verdict, truncate,
};

const SNIPPET_CHARS: usize = 240;

/// One config source line for the `config` command.
#[derive(Debug, Clone)]
pub struct SourceLine<'a> {
    pub label: &'a str,
    pub location: &'a str,
    pub found: bool,
}

/// Formats command results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Rule report plus the optional narrative
    pub fn format_evaluation(output: &EvaluateOutput) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Feasibility Report"));
        out.push('\n');
        out.push_str(&Self::format_hypothesis(&output.hypothesis));
        out.push_str(&Self::format_report(&output.report));

        if let Some(narrative) = &output.narrative {
            out.push_str(&Self::section_header("Explanation"));
            out.push_str(narrative.trim());
            out.push('\n');
            if !output.sources.is_empty() {
                out.push_str(&format!("\n{}\n", "Sources:".cyan().bold()));
                out.push_str(&Self::format_sources(&output.sources));
            }
        }
        if let Some(error) = &output.narrative_error {
            out.push_str(&format!(
                "\n{} {}\n",
                "Narrative unavailable:".yellow().bold(),
                error
            ));
        }

        out.push_str(&Self::footer());
        out
    }

    pub fn format_evaluation_json(output: &EvaluateOutput) -> String {
        Self::to_json(&json!({
            "hypothesis": output.hypothesis,
            "report": output.report,
            "narrative": output.narrative,
            "narrative_error": output.narrative_error,
            "sources": output.sources,
        }))
    }

    /// Findings table with a colored verdict per check
    pub fn format_report(report: &FeasibilityReport) -> String {
        let mut out = Self::section_header(&format!("Checks against {}", report.instrument));

        for finding in &report.findings {
            out.push_str(&format!(
                "  {} {:<18} {}\n",
                Self::verdict_label(finding.verdict),
                finding.check.label(),
                finding.message
            ));
        }

        out.push_str(&format!(
            "\n{} {}\n",
            "Overall:".cyan().bold(),
            Self::overall_label(report.overall)
        ));
        out
    }

    pub fn format_hypothesis(h: &Hypothesis) -> String {
        let mut out = String::new();

        out.push_str(&format!("{} {}\n", "Hypothesis:".cyan().bold(), h.title.bold()));
        out.push_str(&format!("{} {}\n", "Id:".dimmed(), h.id));
        out.push_str(&format!("\n{}\n\n", Self::indent(h.statement.trim(), "  ")));

        let sample = match h.sample.thickness_mm {
            Some(t) => format!("{} ({}, {} mm)", h.sample.material, h.sample.class, format_number(t)),
            None => format!("{} ({})", h.sample.material, h.sample.class),
        };
        out.push_str(&format!("  {:<12} {}\n", "Sample", sample));
        out.push_str(&format!(
            "  {:<12} {} ({})\n",
            "Geometry",
            h.geometry,
            h.geometry.description()
        ));
        out.push_str(&format!("  {:<12} {} 1/A\n", "q range", h.q_range));
        out.push_str(&format!("  {:<12} {} s\n", "Timescale", h.timescale));
        if let Some(energy) = h.energy_kev {
            out.push_str(&format!("  {:<12} {} keV\n", "Energy", format_number(energy)));
        }
        if let Some(temperature) = &h.temperature_k {
            out.push_str(&format!("  {:<12} {} K\n", "Temperature", temperature));
        }
        if let Some(environment) = &h.environment {
            out.push_str(&format!("  {:<12} {}\n", "Environment", environment));
        }
        if let Some(rationale) = &h.rationale {
            out.push_str(&format!("\n{}\n{}\n", "Rationale:".cyan().bold(), rationale.trim()));
        }
        if !h.references.is_empty() {
            out.push_str(&format!("\n{}\n", "References:".cyan().bold()));
            for reference in &h.references {
                out.push_str(&format!("  * {}\n", reference));
            }
        }
        out
    }

    pub fn format_draft(output: &DraftOutput) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Drafted Hypothesis"));
        out.push('\n');
        out.push_str(&Self::format_hypothesis(&output.hypothesis));
        out.push_str(&Self::format_report(&output.report));

        if !output.sources.is_empty() {
            out.push_str(&Self::section_header("Grounding sources"));
            out.push_str(&Self::format_sources(&output.sources));
        }
        if output.attempts > 1 {
            out.push_str(&format!(
                "\n{}\n",
                format!("(parsed after {} attempts)", output.attempts).dimmed()
            ));
        }

        out.push_str(&Self::footer());
        out
    }

    pub fn format_draft_json(output: &DraftOutput) -> String {
        Self::to_json(&json!({
            "hypothesis": output.hypothesis,
            "report": output.report,
            "sources": output.sources,
            "attempts": output.attempts,
        }))
    }

    pub fn format_answer(output: &AskOutput) -> String {
        let mut out = format!("{}\n", output.answer.trim());
        if !output.sources.is_empty() {
            out.push_str(&format!("\n{}\n", "Sources:".cyan().bold()));
            out.push_str(&Self::format_sources(&output.sources));
        }
        out
    }

    pub fn format_answer_json(output: &AskOutput) -> String {
        Self::to_json(&json!({
            "answer": output.answer,
            "sources": output.sources,
        }))
    }

    /// Numbered source list matching the `[n]` markers used in prompts
    pub fn format_sources(sources: &[ScoredChunk]) -> String {
        let mut out = String::new();
        for (i, hit) in sources.iter().enumerate() {
            out.push_str(&format!(
                "  [{}] {} {}\n",
                i + 1,
                hit.document_title,
                format!("({})", hit.kind).dimmed()
            ));
            if let Some(path) = &hit.path {
                out.push_str(&format!("      {}\n", path.dimmed()));
            }
        }
        out
    }

    pub fn format_search(query: &str, hits: &[ScoredChunk]) -> String {
        let mut out = format!("{} {}\n", "Query:".cyan().bold(), query);

        if hits.is_empty() {
            out.push_str(&format!("\n{}\n", "No matching passages.".yellow()));
            return out;
        }

        for (i, hit) in hits.iter().enumerate() {
            out.push_str(&format!(
                "\n{} {} {}\n",
                format!("[{}]", i + 1).yellow().bold(),
                hit.document_title.bold(),
                format!("({}, score {:.2})", hit.kind, hit.score).dimmed()
            ));
            if let Some(path) = &hit.path {
                out.push_str(&format!("    {}\n", path.dimmed()));
            }
            let snippet = truncate(&hit.chunk.text.replace('\n', " "), SNIPPET_CHARS);
            out.push_str(&format!("{}\n", Self::indent(&snippet, "    ")));
        }
        out
    }

    pub fn format_search_json(query: &str, hits: &[ScoredChunk]) -> String {
        Self::to_json(&json!({
            "query": query,
            "hits": hits,
        }))
    }

    pub fn format_harvest(summary: &HarvestSummary) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Harvest Summary"));
        out.push('\n');
        out.push_str(&format!(
            "  {} {}   {} {}   {} {}   {} {}\n",
            "Total:".bold(),
            summary.total,
            "Downloaded:".green().bold(),
            summary.succeeded,
            "Manual:".yellow().bold(),
            summary.failed,
            "Errors:".red().bold(),
            summary.errored
        ));
        if summary.cancelled {
            out.push_str(&format!(
                "  {}\n",
                "Interrupted before the end of the batch.".yellow()
            ));
        }

        let pending: Vec<_> = summary
            .records
            .iter()
            .filter(|r| r.status != DownloadStatus::Success)
            .collect();
        if !pending.is_empty() {
            out.push_str(&Self::section_header("Needs attention"));
            for record in pending {
                let detail = record
                    .reason
                    .as_deref()
                    .or(record.error.as_deref())
                    .unwrap_or("unknown");
                out.push_str(&format!(
                    "  {} #{} {}\n",
                    Self::status_label(record.status),
                    record.index,
                    truncate(&record.citation, 80)
                ));
                out.push_str(&format!("      {}\n", detail.dimmed()));
                if let Some(file) = &record.file {
                    out.push_str(&format!("      {} {}\n", "note:".dimmed(), file));
                }
            }
        }

        out.push_str(&format!(
            "\n{} {}\n",
            "Output directory:".cyan().bold(),
            summary.output_dir.display()
        ));
        if let Some(log) = &summary.log_file {
            out.push_str(&format!("{} {}\n", "Batch log:".cyan().bold(), log.display()));
        }

        out.push_str(&Self::footer());
        out
    }

    pub fn format_harvest_json(summary: &HarvestSummary) -> String {
        Self::to_json(summary)
    }

    pub fn format_instrument(profile: &InstrumentProfile) -> String {
        let mut out = Self::header(&profile.name);
        out.push('\n');
        out.push_str(&format!("{} {}\n\n", "Facility:".cyan().bold(), profile.facility));
        out.push_str(&profile.summary());
        out.push_str(&Self::footer());
        out
    }

    pub fn format_instrument_json(profile: &InstrumentProfile) -> String {
        Self::to_json(profile)
    }

    pub fn format_config(sources: &[SourceLine<'_>], issues: &[ConfigIssue]) -> String {
        let mut out = format!("{}\n", "Configuration sources (highest priority first):".bold());

        for source in sources {
            let marker = if source.found {
                "found".green()
            } else {
                "not found".dimmed()
            };
            out.push_str(&format!(
                "  {:<9} {} [{}]\n",
                source.label,
                source.location,
                marker
            ));
        }

        if issues.is_empty() {
            out.push_str(&format!("\n{}\n", "No configuration issues.".green()));
        } else {
            out.push_str(&format!("\n{}\n", "Issues:".bold()));
            for issue in issues {
                out.push_str(&format!("  {}\n", Self::format_issue(issue)));
            }
        }
        out
    }

    pub fn format_config_json(sources: &[SourceLine<'_>], issues: &[ConfigIssue]) -> String {
        let sources: Vec<Value> = sources
            .iter()
            .map(|s| json!({ "label": s.label, "location": s.location, "found": s.found }))
            .collect();
        let issues: Vec<Value> = issues
            .iter()
            .map(|i| {
                json!({
                    "severity": Self::severity_str(i.severity),
                    "code": format!("{:?}", i.code),
                    "message": i.message,
                })
            })
            .collect();
        Self::to_json(&json!({ "sources": sources, "issues": issues }))
    }

    /// One-line rendering used both by `config` and by startup warnings
    pub fn format_issue(issue: &ConfigIssue) -> String {
        let label = match issue.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        format!("{}: {}", label, issue.message)
    }

    fn severity_str(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    fn verdict_label(verdict: Verdict) -> ColoredString {
        let text = format!("{:<8}", verdict.as_str().to_uppercase());
        match verdict {
            Verdict::Pass => text.green().bold(),
            Verdict::Marginal => text.yellow().bold(),
            Verdict::Fail => text.red().bold(),
            Verdict::NotApplicable => text.dimmed(),
        }
    }

    fn overall_label(overall: Overall) -> ColoredString {
        let text = overall.to_string().to_uppercase();
        match overall {
            Overall::Feasible => text.green().bold(),
            Overall::Conditional => text.yellow().bold(),
            Overall::Infeasible => text.red().bold(),
        }
    }

    pub(crate) fn status_label(status: DownloadStatus) -> ColoredString {
        match status {
            DownloadStatus::Success => "ok".green().bold(),
            DownloadStatus::Failed => "manual".yellow().bold(),
            DownloadStatus::Error => "error".red().bold(),
        }
    }

    fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use xpcs_domain::{
        Chunk, Citation, ConfigIssueCode, DownloadRecord, FeasibilityEvaluator,
        FeasibilityThresholds, HypothesisBuilder, SampleClass, SourceKind,
    };

    fn plain() {
        colored::control::set_override(false);
    }

    fn hypothesis() -> Hypothesis {
        HypothesisBuilder::new(
            "Colloid calibration",
            "Colloid diffusion in glycerol follows Stokes-Einstein.",
        )
        .sample("silica in glycerol", SampleClass::Colloid)
        .q_range(0.002, 0.02)
        .timescale(0.01, 10.0)
        .build()
        .unwrap()
    }

    fn hit(title: &str, text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                doc_id: title.to_string(),
                ordinal: 0,
                text: text.to_string(),
            },
            document_title: title.to_string(),
            kind: SourceKind::Textbook,
            path: Some(format!("knowledge/textbooks/{title}.md")),
            score: 2.5,
        }
    }

    fn evaluation() -> EvaluateOutput {
        let h = hypothesis();
        let report = FeasibilityEvaluator::new(FeasibilityThresholds::default())
            .evaluate(&h, &InstrumentProfile::aps_8id_i());
        EvaluateOutput {
            hypothesis: h,
            report,
            narrative: None,
            narrative_error: Some("no provider".to_string()),
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_report_lists_every_finding() {
        plain();
        let output = evaluation();
        let text = ConsoleFormatter::format_evaluation(&output);

        for finding in &output.report.findings {
            assert!(text.contains(finding.check.label()), "missing {}", finding.check);
        }
        assert!(text.contains("Overall:"));
        assert!(text.contains("Narrative unavailable: no provider"));
    }

    #[test]
    fn test_evaluation_json_shape() {
        let output = evaluation();
        let value: Value =
            serde_json::from_str(&ConsoleFormatter::format_evaluation_json(&output)).unwrap();

        assert_eq!(value["hypothesis"]["title"], "Colloid calibration");
        assert!(value["report"]["findings"].is_array());
        assert!(value["narrative"].is_null());
    }

    #[test]
    fn test_search_without_hits() {
        plain();
        let text = ConsoleFormatter::format_search("speckle", &[]);
        assert!(text.contains("No matching passages."));
    }

    #[test]
    fn test_search_snippet_is_truncated() {
        plain();
        let long = "intensity autocorrelation ".repeat(40);
        let text = ConsoleFormatter::format_search("g2", &[hit("Berne_Pecora", &long)]);

        assert!(text.contains("[1] Berne_Pecora"));
        assert!(text.contains("..."));
        assert!(text.contains("knowledge/textbooks/Berne_Pecora.md"));
    }

    #[test]
    fn test_harvest_lists_only_pending_records() {
        plain();
        let ok = Citation::parse("Sutton M. 2008. A review of XPCS. C R Phys").unwrap();
        let missing = Citation::parse("Grübel G. 2008. XPCS at ESRF. Nucl Instr").unwrap();
        let summary = HarvestSummary {
            total: 2,
            succeeded: 1,
            failed: 1,
            errored: 0,
            log_file: Some(PathBuf::from("out/download_log_batch_1_20260101_000000.json")),
            output_dir: PathBuf::from("out"),
            cancelled: false,
            records: vec![
                DownloadRecord::success(&ok, 1, "001_Sutton_2008.pdf"),
                DownloadRecord::failed(
                    &missing,
                    2,
                    "No open-access PDF found",
                    Some("002_manual_download.txt".to_string()),
                ),
            ],
        };

        let text = ConsoleFormatter::format_harvest(&summary);
        assert!(text.contains("#2"));
        assert!(!text.contains("#1 "));
        assert!(text.contains("No open-access PDF found"));
        assert!(text.contains("002_manual_download.txt"));
        assert!(text.contains("download_log_batch_1_"));
    }

    #[test]
    fn test_config_issues_rendered() {
        plain();
        let sources = [SourceLine {
            label: "Project",
            location: "./xpcs.toml",
            found: true,
        }];
        let issues = [ConfigIssue::error(
            ConfigIssueCode::ZeroTopK,
            "knowledge.top_k must be at least 1",
        )];

        let text = ConsoleFormatter::format_config(&sources, &issues);
        assert!(text.contains("./xpcs.toml [found]"));
        assert!(text.contains("error: knowledge.top_k must be at least 1"));

        let json: Value =
            serde_json::from_str(&ConsoleFormatter::format_config_json(&sources, &issues)).unwrap();
        assert_eq!(json["issues"][0]["severity"], "error");
        assert_eq!(json["issues"][0]["code"], "ZeroTopK");
    }

    #[test]
    fn test_instrument_json_round_trips() {
        let profile = InstrumentProfile::aps_8id_i();
        let json = ConsoleFormatter::format_instrument_json(&profile);
        let back: InstrumentProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}

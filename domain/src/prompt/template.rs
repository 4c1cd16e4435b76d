//! Prompt templates for drafting, narratives and question answering

/// Templates for each LLM interaction
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for turning an idea into a structured hypothesis
    pub fn draft_system() -> &'static str {
        r#"You are an experienced XPCS (X-ray Photon Correlation Spectroscopy) beamline scientist.
You help users turn rough experiment ideas into precise, testable hypotheses.
Ground every number in the provided sources and the instrument description.
Answer with a single JSON object and nothing else."#
    }

    /// User prompt for drafting; `context` is the numbered source block
    pub fn draft_prompt(idea: &str, context: &str, instrument_summary: &str) -> String {
        format!(
            r#"Experiment idea:
{idea}

Instrument:
{instrument_summary}
Sources:
{context}

Return one JSON object with exactly these fields:
{{
  "title": "short title",
  "statement": "the testable scientific claim",
  "sample": {{"material": "what is in the beam", "class": "colloid|polymer|glass|metal|magnetic|charge_density_wave|biological|other", "thickness_mm": 1.0}},
  "geometry": "saxs|waxs|gixpcs",
  "q_range": [q_min, q_max],
  "timescale": [t_min_seconds, t_max_seconds],
  "energy_kev": null,
  "temperature_k": null,
  "environment": null,
  "rationale": "why these ranges, citing sources as [n]",
  "references": ["source titles used"]
}}

q_range is in inverse Angstrom. timescale is the range of relaxation times to resolve, in seconds.
Use null for anything the idea does not constrain. Set temperature_k as [min, max] in kelvin and
environment to a sample environment name only when the idea needs them."#
        )
    }

    /// Follow-up sent in the same session when the draft could not be used
    pub fn draft_correction(error: &str) -> String {
        format!(
            r#"That response could not be used: {error}

Reply again with only the corrected JSON object, following the same field list.
All ranges must be [min, max] with 0 < min <= max."#
        )
    }

    /// System prompt for explaining a feasibility report
    pub fn narrative_system() -> &'static str {
        r#"You are an XPCS beamline scientist reviewing a proposal.
A rule-based checker has already judged the hypothesis against the instrument.
Explain its findings in plain language, keep its verdicts, and suggest concrete
changes (q-range, timescale, environment, dose mitigation) that would make the
experiment feasible. Cite sources as [n] when you use them."#
    }

    pub fn narrative_prompt(hypothesis_json: &str, report_text: &str, context: &str) -> String {
        format!(
            r#"Hypothesis:
{hypothesis_json}

{report_text}
Sources:
{context}

Write a short assessment (at most three paragraphs)."#
        )
    }

    /// System prompt for question answering over retrieved sources
    pub fn ask_system(instrument_summary: &str) -> String {
        format!(
            r#"You are an assistant for XPCS experiment planning at a synchrotron beamline.
Answer using the numbered sources provided with each question and cite them as [n].
If the sources do not cover the question, say so before answering from general knowledge.

{instrument_summary}"#
        )
    }

    pub fn ask_prompt(question: &str, context: &str, history: &str) -> String {
        let mut prompt = String::new();
        if !history.is_empty() {
            prompt.push_str("Conversation so far:\n");
            prompt.push_str(history);
            prompt.push_str("\n\n");
        }
        if context.is_empty() {
            prompt.push_str("Sources: none matched this question.\n\n");
        } else {
            prompt.push_str("Sources:\n");
            prompt.push_str(context);
            prompt.push_str("\n\n");
        }
        prompt.push_str("Question: ");
        prompt.push_str(question);
        prompt
    }

    /// System prompt for the interactive chat
    pub fn chat_system(instrument_summary: &str) -> String {
        format!(
            r#"{}
In this chat the user may refine a hypothesis over several turns. Keep answers short
and quantitative (q in 1/A, times in seconds, temperatures in K)."#,
            Self::ask_system(instrument_summary)
        )
    }
}

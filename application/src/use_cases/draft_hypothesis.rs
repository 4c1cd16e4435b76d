//! Draft Hypothesis use case
//!
//! Turns a free-text idea into a structured [`Hypothesis`] grounded in
//! retrieved sources, then checks it against the instrument.
//!
//! Flow:
//! 1. Retrieve sources for the idea
//! 2. Ask the model for a JSON hypothesis
//! 3. Parse and validate; on failure send one correction in the same session
//! 4. Run the feasibility rules on the result

use crate::config::BehaviorConfig;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::use_cases::shared::{CONTEXT_CHARS, retrieve, send_logged};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use xpcs_domain::{
    FeasibilityEvaluator, FeasibilityReport, FeasibilityThresholds, Hypothesis, InstrumentProfile,
    KnowledgeIndex, Model, PromptTemplate, ScoredChunk, format_context, parse_hypothesis_json,
    truncate,
};

/// Correction rounds after the first answer.
const MAX_CORRECTIONS: usize = 1;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("The experiment idea is empty")]
    EmptyIdea,

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Model did not return a usable hypothesis after {attempts} attempt(s): {error}")]
    Unparseable {
        attempts: usize,
        error: String,
        raw_response: String,
    },
}

#[derive(Debug, Clone)]
pub struct DraftInput {
    pub idea: String,
    pub model: Model,
    pub top_k: usize,
    pub instrument: InstrumentProfile,
    pub thresholds: FeasibilityThresholds,
}

impl DraftInput {
    pub fn new(idea: impl Into<String>, model: Model, instrument: InstrumentProfile) -> Self {
        Self {
            idea: idea.into(),
            model,
            top_k: 5,
            instrument,
            thresholds: FeasibilityThresholds::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_thresholds(mut self, thresholds: FeasibilityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DraftOutput {
    pub hypothesis: Hypothesis,
    pub report: FeasibilityReport,
    pub sources: Vec<ScoredChunk>,
    /// Model answer the hypothesis was parsed from.
    pub raw_response: String,
    pub attempts: usize,
}

/// Use case for drafting a hypothesis from an idea
pub struct DraftHypothesisUseCase {
    gateway: Arc<dyn LlmGateway>,
    index: Arc<KnowledgeIndex>,
    behavior: BehaviorConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl DraftHypothesisUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, index: Arc<KnowledgeIndex>) -> Self {
        Self {
            gateway,
            index,
            behavior: BehaviorConfig::default(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub async fn execute(&self, input: DraftInput) -> Result<DraftOutput, DraftError> {
        let idea = input.idea.trim();
        if idea.is_empty() {
            return Err(DraftError::EmptyIdea);
        }
        info!("Drafting hypothesis with {}: {}", input.model, truncate(idea, 100));

        let sources = retrieve(&self.index, idea, input.top_k);
        let context = format_context(&sources, CONTEXT_CHARS);

        let session = self
            .gateway
            .create_session_with_system_prompt(&input.model, PromptTemplate::draft_system())
            .await?;

        let mut prompt = PromptTemplate::draft_prompt(idea, &context, &input.instrument.summary());
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = send_logged(
                session.as_ref(),
                "draft",
                &prompt,
                &self.behavior,
                self.conversation_logger.as_ref(),
            )
            .await?;

            match parse_hypothesis_json(&response) {
                Ok(hypothesis) => {
                    debug!("Parsed hypothesis '{}' on attempt {}", hypothesis.id, attempts);
                    let report = FeasibilityEvaluator::new(input.thresholds.clone())
                        .evaluate(&hypothesis, &input.instrument);
                    info!("Draft '{}' is {}", hypothesis.id, report.overall);

                    self.conversation_logger.log(ConversationEvent::new(
                        "draft",
                        json!({
                            "idea": idea,
                            "attempts": attempts,
                            "hypothesis": &hypothesis,
                            "report": &report,
                        }),
                    ));

                    return Ok(DraftOutput {
                        hypothesis,
                        report,
                        sources,
                        raw_response: response,
                        attempts,
                    });
                }
                Err(e) if attempts <= MAX_CORRECTIONS => {
                    warn!("Draft attempt {} unusable ({}), asking for a correction", attempts, e);
                    prompt = PromptTemplate::draft_correction(&e.to_string());
                }
                Err(e) => {
                    return Err(DraftError::Unparseable {
                        attempts,
                        error: e.to_string(),
                        raw_response: response,
                    });
                }
            }
        }
    }
}

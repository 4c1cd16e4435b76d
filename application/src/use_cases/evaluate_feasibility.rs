//! Evaluate Feasibility use case
//!
//! Runs the rule evaluator and, on request, asks an LLM to explain the
//! report. The rule report never depends on the LLM.

use crate::config::BehaviorConfig;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::use_cases::shared::{CONTEXT_CHARS, retrieve, send_logged};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use xpcs_domain::{
    DomainError, FeasibilityEvaluator, FeasibilityReport, FeasibilityThresholds, Hypothesis,
    InstrumentProfile, KnowledgeIndex, Model, PromptTemplate, ScoredChunk, format_context,
};

#[derive(Error, Debug)]
pub enum EvaluateError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// LLM explanation requested alongside the rule report.
#[derive(Debug, Clone)]
pub struct NarrativeRequest {
    pub model: Model,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct EvaluateInput {
    pub hypothesis: Hypothesis,
    pub instrument: InstrumentProfile,
    pub thresholds: FeasibilityThresholds,
    pub narrative: Option<NarrativeRequest>,
}

impl EvaluateInput {
    pub fn new(hypothesis: Hypothesis, instrument: InstrumentProfile) -> Self {
        Self {
            hypothesis,
            instrument,
            thresholds: FeasibilityThresholds::default(),
            narrative: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: FeasibilityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_narrative(mut self, model: Model, top_k: usize) -> Self {
        self.narrative = Some(NarrativeRequest { model, top_k });
        self
    }
}

#[derive(Debug, Clone)]
pub struct EvaluateOutput {
    pub hypothesis: Hypothesis,
    pub report: FeasibilityReport,
    pub narrative: Option<String>,
    /// Why a requested narrative is missing.
    pub narrative_error: Option<String>,
    pub sources: Vec<ScoredChunk>,
}

/// Use case for checking a hypothesis against an instrument
pub struct EvaluateFeasibilityUseCase {
    gateway: Arc<dyn LlmGateway>,
    index: Arc<KnowledgeIndex>,
    behavior: BehaviorConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl EvaluateFeasibilityUseCase {
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

    pub async fn execute(&self, input: EvaluateInput) -> Result<EvaluateOutput, EvaluateError> {
        input.hypothesis.validate()?;
        input.instrument.validate()?;

        let report =
            FeasibilityEvaluator::new(input.thresholds.clone()).evaluate(&input.hypothesis, &input.instrument);
        info!(
            "Evaluated '{}' on {}: {}",
            report.hypothesis_id, report.instrument, report.overall
        );
        self.conversation_logger.log(ConversationEvent::new(
            "feasibility_report",
            json!({ "hypothesis": &input.hypothesis, "report": &report }),
        ));

        let mut output = EvaluateOutput {
            hypothesis: input.hypothesis,
            report,
            narrative: None,
            narrative_error: None,
            sources: Vec::new(),
        };

        if let Some(request) = input.narrative {
            output.sources = retrieve(&self.index, &output.hypothesis.statement, request.top_k);
            match self.narrate(&output, &request).await {
                Ok(text) => output.narrative = Some(text),
                Err(e) => {
                    warn!("Narrative unavailable, returning rule report only: {}", e);
                    output.narrative_error = Some(e.to_string());
                }
            }
        }

        Ok(output)
    }

    async fn narrate(
        &self,
        output: &EvaluateOutput,
        request: &NarrativeRequest,
    ) -> Result<String, GatewayError> {
        let session = self
            .gateway
            .create_session_with_system_prompt(&request.model, PromptTemplate::narrative_system())
            .await?;

        let hypothesis_json = serde_json::to_string_pretty(&output.hypothesis)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let prompt = PromptTemplate::narrative_prompt(
            &hypothesis_json,
            &output.report.to_prompt_text(),
            &format_context(&output.sources, CONTEXT_CHARS),
        );

        let text = send_logged(
            session.as_ref(),
            "narrative",
            &prompt,
            &self.behavior,
            self.conversation_logger.as_ref(),
        )
        .await?;
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidResponse("empty narrative".into()));
        }
        Ok(text.trim().to_string())
    }
}

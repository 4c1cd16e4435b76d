//! Ask use case.
//!
//! Answers a question from retrieved sources, the chat history and the
//! instrument summary. Each call opens a fresh session; the history travels
//! in the prompt so the bounded [`Conversation`] stays the single source of
//! truth.

use crate::config::BehaviorConfig;
use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::use_cases::shared::{CONTEXT_CHARS, retrieve, send_logged};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use xpcs_domain::{
    Conversation, InstrumentProfile, KnowledgeIndex, Model, PromptTemplate, ScoredChunk,
    format_context, truncate,
};

#[derive(Error, Debug)]
pub enum AskError {
    #[error("The question is empty")]
    EmptyQuestion,

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("No response from model")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct AskInput {
    pub question: String,
    pub model: Model,
    pub top_k: usize,
    pub conversation: Conversation,
}

impl AskInput {
    pub fn new(question: impl Into<String>, model: Model) -> Self {
        Self {
            question: question.into(),
            model,
            top_k: 5,
            conversation: Conversation::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }
}

#[derive(Debug, Clone)]
pub struct AskOutput {
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
}

/// Use case for grounded question answering
pub struct AskUseCase {
    gateway: Arc<dyn LlmGateway>,
    index: Arc<KnowledgeIndex>,
    instrument: Arc<InstrumentProfile>,
    behavior: BehaviorConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl AskUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        index: Arc<KnowledgeIndex>,
        instrument: Arc<InstrumentProfile>,
    ) -> Self {
        Self {
            gateway,
            index,
            instrument,
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

    pub async fn execute(&self, input: AskInput) -> Result<AskOutput, AskError> {
        let question = input.question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }
        info!("Ask ({}): {}", input.model, truncate(question, 100));

        let sources = retrieve(&self.index, question, input.top_k);
        let system = PromptTemplate::ask_system(&self.instrument.summary());
        let session = self
            .gateway
            .create_session_with_system_prompt(&input.model, &system)
            .await?;

        let prompt = PromptTemplate::ask_prompt(
            question,
            &format_context(&sources, CONTEXT_CHARS),
            &input.conversation.transcript(),
        );
        let answer = send_logged(
            session.as_ref(),
            "ask",
            &prompt,
            &self.behavior,
            self.conversation_logger.as_ref(),
        )
        .await?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AskError::EmptyResponse);
        }
        Ok(AskOutput {
            answer: answer.to_string(),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockGateway, Script, sample_index};
    use std::time::Duration;

    fn use_case(script: &Script) -> AskUseCase {
        AskUseCase::new(
            Arc::new(MockGateway::new(script.clone())),
            Arc::new(sample_index()),
            Arc::new(InstrumentProfile::aps_8id_i()),
        )
    }

    #[tokio::test]
    async fn test_ask_includes_sources_history_and_instrument() {
        let script = Script::ok(&["Use SAXS geometry [1]."]);
        let mut conversation = Conversation::new(4);
        conversation.push_exchange("Which calibrant?", "Silica in glycerol.");

        let output = use_case(&script)
            .execute(
                AskInput::new("How is colloid diffusion measured?", Model::default())
                    .with_conversation(conversation),
            )
            .await
            .unwrap();

        assert_eq!(output.answer, "Use SAXS geometry [1].");
        assert_eq!(output.sources[0].chunk.doc_id, "handbook");

        let prompt = &script.prompts()[0];
        assert!(prompt.contains("User: Which calibrant?"));
        assert!(prompt.contains("[1] 8-ID-I data handbook"));
        assert!(script.system_prompts.lock().unwrap()[0].contains("Instrument: 8-ID-I"));
    }

    #[tokio::test]
    async fn test_question_without_matches_still_answered() {
        let script = Script::ok(&["General answer."]);
        let output = use_case(&script)
            .execute(AskInput::new("What about rheology?", Model::default()))
            .await
            .unwrap();
        assert!(output.sources.is_empty());
        assert!(script.prompts()[0].contains("none matched"));
    }

    #[tokio::test]
    async fn test_empty_question_and_response() {
        let script = Script::ok(&["   "]);
        assert!(matches!(
            use_case(&script).execute(AskInput::new(" ", Model::default())).await,
            Err(AskError::EmptyQuestion)
        ));
        assert!(matches!(
            use_case(&script).execute(AskInput::new("g2?", Model::default())).await,
            Err(AskError::EmptyResponse)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_gateway_timeout() {
        use async_trait::async_trait;
        use crate::ports::llm_gateway::LlmSession;

        struct SlowSession(Model);

        #[async_trait]
        impl LlmSession for SlowSession {
            fn model(&self) -> &Model {
                &self.0
            }
            async fn send(&self, _content: &str) -> Result<String, GatewayError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("late".into())
            }
        }

        struct SlowGateway;

        #[async_trait]
        impl LlmGateway for SlowGateway {
            async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
                Ok(Box::new(SlowSession(model.clone())))
            }
            async fn create_session_with_system_prompt(
                &self,
                model: &Model,
                _system_prompt: &str,
            ) -> Result<Box<dyn LlmSession>, GatewayError> {
                self.create_session(model).await
            }
            async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
                Ok(vec![])
            }
        }

        let use_case = AskUseCase::new(
            Arc::new(SlowGateway),
            Arc::new(sample_index()),
            Arc::new(InstrumentProfile::aps_8id_i()),
        )
        .with_behavior(BehaviorConfig::with_timeout_seconds(5));

        let err = use_case
            .execute(AskInput::new("g2?", Model::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, AskError::Gateway(GatewayError::Timeout)));
    }
}

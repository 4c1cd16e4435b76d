//! Shared helpers for use cases.
//!
//! Timeout-aware LLM sends and tolerant retrieval used by the evaluate,
//! draft and ask flows.

use crate::config::BehaviorConfig;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmSession};
use serde_json::json;
use tracing::debug;
use xpcs_domain::{DomainError, KnowledgeIndex, ScoredChunk};

/// Upper bound on the source block embedded into prompts.
pub(crate) const CONTEXT_CHARS: usize = 6000;

/// Send a prompt, applying the configured timeout and logging both sides.
pub(crate) async fn send_logged(
    session: &dyn LlmSession,
    stage: &'static str,
    prompt: &str,
    behavior: &BehaviorConfig,
    logger: &dyn ConversationLogger,
) -> Result<String, GatewayError> {
    let model = session.model().to_string();
    logger.log(ConversationEvent::new(
        "llm_request",
        json!({ "stage": stage, "model": model, "prompt": prompt }),
    ));

    let response = match behavior.timeout {
        Some(limit) => tokio::time::timeout(limit, session.send(prompt))
            .await
            .map_err(|_| GatewayError::Timeout)??,
        None => session.send(prompt).await?,
    };

    logger.log(ConversationEvent::new(
        "llm_response",
        json!({ "stage": stage, "model": model, "response": response }),
    ));
    Ok(response)
}

/// Retrieve sources for `query`; a query with no searchable terms yields none.
pub(crate) fn retrieve(index: &KnowledgeIndex, query: &str, top_k: usize) -> Vec<ScoredChunk> {
    match index.search(query, top_k) {
        Ok(hits) => {
            debug!("Retrieved {} chunk(s) for query", hits.len());
            hits
        }
        Err(DomainError::EmptyQuery) => {
            debug!("Query has no searchable terms, skipping retrieval");
            Vec::new()
        }
        Err(e) => {
            debug!("Retrieval failed: {}", e);
            Vec::new()
        }
    }
}

//! OpenAI-compatible Chat Completions provider
//!
//! Works with the OpenAI API and with servers that mirror it (vLLM, Ollama,
//! Azure OpenAI) through `base_url`.

use super::http::{RetryPolicy, build_client, send_with_retry};
use super::{ChatTurn, ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use xpcs_application::{GatewayError, LlmSession};
use xpcs_domain::Model;

struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    temperature: Option<f32>,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    async fn complete(&self, model: &Model, messages: Vec<ChatTurn>) -> Result<String, GatewayError> {
        let request = ChatCompletionRequest {
            model: model.as_str(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(model = %model, messages = request.messages.len(), "Calling chat completions");

        let response = send_with_retry("openai", &self.retry, || {
            self.http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
        })
        .await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("openai: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("openai: no choices in response".into()))
    }
}

pub struct OpenAiCompatibleProvider {
    client: Arc<OpenAiClient>,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Arc::new(OpenAiClient {
                http: build_client(None),
                api_key: api_key.into(),
                base_url: base_url.into(),
                max_tokens: 4096,
                temperature: None,
                retry: RetryPolicy::default(),
            }),
        }
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        max_tokens: u32,
        temperature: Option<f32>,
        timeout: Option<Duration>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: Arc::new(OpenAiClient {
                http: build_client(timeout),
                api_key: api_key.into(),
                base_url: base_url.into(),
                max_tokens,
                temperature,
                retry,
            }),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(OpenAiSession {
            client: self.client.clone(),
            model: model.clone(),
            history: Mutex::new(Vec::new()),
        }))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(OpenAiSession {
            client: self.client.clone(),
            model: model.clone(),
            history: Mutex::new(vec![ChatTurn {
                role: "system",
                content: system_prompt.to_string(),
            }]),
        }))
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        Ok(vec![Model::Gpt5, Model::Gpt5Mini, Model::Gpt41, Model::Gpt41Mini])
    }
}

/// Chat session; the API is stateless so the full history is resent.
pub struct OpenAiSession {
    client: Arc<OpenAiClient>,
    model: Model,
    history: Mutex<Vec<ChatTurn>>,
}

#[async_trait]
impl LlmSession for OpenAiSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let mut history = self.history.lock().await;
        let mut messages = history.clone();
        messages.push(ChatTurn::user(content));

        let reply = self.client.complete(&self.model, messages).await?;

        // Only successful exchanges enter the history
        history.push(ChatTurn::user(content));
        history.push(ChatTurn::assistant(reply.clone()));
        Ok(reply)
    }
}

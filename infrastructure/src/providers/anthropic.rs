//! Anthropic Messages API provider.

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

/// Current Anthropic API version header value.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    api_version: String,
    max_tokens: u32,
    temperature: Option<f32>,
    retry: RetryPolicy,
}

/// Request body for the Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicClient {
    async fn complete(
        &self,
        model: &Model,
        system: Option<&str>,
        messages: Vec<ChatTurn>,
    ) -> Result<String, GatewayError> {
        let request = MessagesRequest {
            model: model.as_str(),
            max_tokens: self.max_tokens,
            system,
            messages,
            temperature: self.temperature,
        };
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        debug!(model = %model, messages = request.messages.len(), "Calling Anthropic Messages API");

        let response = send_with_retry("anthropic", &self.retry, || {
            self.http
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", &self.api_version)
                .json(&request)
        })
        .await?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("anthropic: {e}")))?;

        let text: String = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        if text.is_empty() {
            return Err(GatewayError::InvalidResponse(
                "anthropic: response has no text content".into(),
            ));
        }
        Ok(text)
    }
}

pub struct AnthropicProvider {
    client: Arc<AnthropicClient>,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_options(
            api_key,
            base_url,
            DEFAULT_API_VERSION,
            4096,
            None,
            None,
            RetryPolicy::default(),
        )
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        max_tokens: u32,
        temperature: Option<f32>,
        timeout: Option<Duration>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: Arc::new(AnthropicClient {
                http: build_client(timeout),
                api_key: api_key.into(),
                base_url: base_url.into(),
                api_version: api_version.into(),
                max_tokens,
                temperature,
                retry,
            }),
        }
    }

    fn session(&self, model: &Model, system_prompt: Option<String>) -> Box<dyn LlmSession> {
        Box::new(AnthropicSession {
            client: self.client.clone(),
            model: model.clone(),
            system_prompt,
            history: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(self.session(model, None))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(self.session(model, Some(system_prompt.to_string())))
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        Ok(vec![
            Model::ClaudeOpus45,
            Model::ClaudeSonnet45,
            Model::ClaudeHaiku45,
            Model::ClaudeSonnet4,
        ])
    }
}

/// Claude session; history is kept locally and resent on every call.
pub struct AnthropicSession {
    client: Arc<AnthropicClient>,
    model: Model,
    system_prompt: Option<String>,
    history: Mutex<Vec<ChatTurn>>,
}

#[async_trait]
impl LlmSession for AnthropicSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let mut history = self.history.lock().await;
        let mut messages = history.clone();
        messages.push(ChatTurn::user(content));

        let reply = self
            .client
            .complete(&self.model, self.system_prompt.as_deref(), messages)
            .await?;

        history.push(ChatTurn::user(content));
        history.push(ChatTurn::assistant(reply.clone()));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> AnthropicProvider {
        AnthropicProvider::with_options(
            "test-key",
            server.uri(),
            DEFAULT_API_VERSION,
            1024,
            None,
            None,
            RetryPolicy {
                max_retries: 1,
                base_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
            },
        )
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", DEFAULT_API_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-sonnet-4-5",
                "system": "You draft XPCS hypotheses.",
                "messages": [{"role": "user", "content": "Aging in a metallic glass"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "message",
                "content": [{"type": "text", "text": "{\"title\": "}, {"type": "text", "text": "\"Aging\"}"}],
                "model": "claude-sonnet-4-5",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = provider(&server)
            .create_session_with_system_prompt(&Model::ClaudeSonnet45, "You draft XPCS hypotheses.")
            .await
            .unwrap();
        let text = session.send("Aging in a metallic glass").await.unwrap();
        assert_eq!(text, "{\"title\": \"Aging\"}");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_model_not_available() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "type": "error",
                "error": {"type": "not_found_error", "message": "model: claude-nope"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = provider(&server)
            .create_session(&Model::Custom("claude-nope".into()))
            .await
            .unwrap();
        let err = session.send("hi").await.unwrap_err();
        assert!(matches!(err, GatewayError::ModelNotAvailable(m) if m.contains("claude-nope")));
    }

    #[tokio::test]
    async fn test_overloaded_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "recovered"}]
            })))
            .mount(&server)
            .await;

        let session = provider(&server).create_session(&Model::ClaudeHaiku45).await.unwrap();
        assert_eq!(session.send("hi").await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn test_failed_turn_not_kept_in_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "second"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "fine"}]
            })))
            .mount(&server)
            .await;

        let session = provider(&server).create_session(&Model::ClaudeHaiku45).await.unwrap();
        assert!(session.send("first").await.is_err());
        assert_eq!(session.send("second").await.unwrap(), "fine");
    }
}

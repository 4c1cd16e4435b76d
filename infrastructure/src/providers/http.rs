//! Shared HTTP plumbing for the LLM providers: retry loop and error mapping.

use reqwest::{RequestBuilder, Response, StatusCode, header::HeaderMap};
use std::time::Duration;
use tracing::warn;
use xpcs_application::GatewayError;
use xpcs_domain::truncate;

/// Upper bound on a server-requested `retry-after` wait.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Retry behavior for transient provider failures
///
/// Network errors, 5xx and 429 are retried; 429 honors `retry-after`.
/// Authentication and not-found errors fail immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// `base_backoff * 2^attempt`, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }
}

/// Send the request built by `build`, retrying per `policy`.
///
/// `build` is called once per attempt because a `RequestBuilder` is consumed
/// by `send`.
pub(crate) async fn send_with_retry<F>(
    provider: &str,
    policy: &RetryPolicy,
    build: F,
) -> Result<Response, GatewayError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0u32;
    loop {
        let (error, wait) = match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let retry_after = retry_after(response.headers());
                let body = response.text().await.unwrap_or_default();
                let error = status_error(provider, status, &body);
                if !is_retryable(status) {
                    return Err(error);
                }
                (error, retry_after.unwrap_or_else(|| policy.backoff(attempt)))
            }
            Err(e) => (network_error(provider, &e), policy.backoff(attempt)),
        };

        if attempt >= policy.max_retries {
            return Err(error);
        }
        warn!(
            provider,
            attempt = attempt + 1,
            wait_ms = wait.as_millis() as u64,
            "{}; retrying",
            error
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_secs_f64(secs).min(MAX_RETRY_AFTER))
}

/// Message from an `{"error": {"message": ..}}` body, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate(body.trim(), 300))
}

pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> GatewayError {
    let message = format!("{provider} HTTP {}: {}", status.as_u16(), error_message(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Authentication(message),
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(message),
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited(message),
        _ => GatewayError::RequestFailed(message),
    }
}

fn network_error(provider: &str, e: &reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Connection(format!("{provider}: {e}"))
    }
}

/// Client with the configured per-request timeout.
pub(crate) fn build_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("xpcs-hypothesis/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(10), Duration::from_secs(30));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error": {"message": "invalid x-api-key"}}"#;
        assert!(matches!(
            status_error("anthropic", StatusCode::UNAUTHORIZED, body),
            GatewayError::Authentication(m) if m.contains("invalid x-api-key")
        ));
        assert!(matches!(
            status_error("openai", StatusCode::NOT_FOUND, "no such model"),
            GatewayError::ModelNotAvailable(m) if m.contains("no such model")
        ));
        assert!(matches!(
            status_error("openai", StatusCode::BAD_GATEWAY, ""),
            GatewayError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "2".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(2)));
        headers.insert(reqwest::header::RETRY_AFTER, "3600".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(MAX_RETRY_AFTER));
        headers.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(retry_after(&headers), None);
    }
}

use super::http::RetryPolicy;
use super::{AnthropicProvider, OpenAiCompatibleProvider, ProviderAdapter, ProviderKind};
use crate::config::FileProvidersConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use xpcs_application::{GatewayError, LlmGateway, LlmSession};
use xpcs_domain::Model;

pub struct RoutingGateway {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    /// Canonical model name to provider index, from `[providers.routing]`.
    explicit_model_routing: HashMap<String, usize>,
    default_kind: Option<ProviderKind>,
}

impl RoutingGateway {
    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>, config: &FileProvidersConfig) -> Self {
        let mut explicit_model_routing = HashMap::new();

        for (model_name, provider_name) in &config.routing {
            let Some(target_kind) = ProviderKind::from_name(provider_name) else {
                continue; // Unknown names are reported by config validation
            };
            if let Some(idx) = providers.iter().position(|p| p.kind() == target_kind) {
                // `claude-sonnet-4.5` and `claude-sonnet-4-5` name the same model
                let Ok(model) = model_name.parse::<Model>();
                explicit_model_routing.insert(model.as_str().to_string(), idx);
            }
        }

        Self {
            providers,
            explicit_model_routing,
            default_kind: config.default.as_deref().and_then(ProviderKind::from_name),
        }
    }

    /// Register every provider that has an API key.
    ///
    /// A missing key is not an error: the provider is skipped and only
    /// commands that need an LLM fail later with `ModelNotAvailable`.
    pub fn from_config(config: &FileProvidersConfig) -> Self {
        let timeout = config.timeout_seconds.map(Duration::from_secs);
        let retry = RetryPolicy::with_max_retries(config.max_retries);
        let mut providers: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

        match config.anthropic.resolve_api_key() {
            Some(key) => providers.push(Arc::new(AnthropicProvider::with_options(
                key,
                &config.anthropic.base_url,
                &config.anthropic.api_version,
                config.anthropic.max_tokens,
                config.anthropic.temperature,
                timeout,
                retry.clone(),
            ))),
            None => debug!(
                "Anthropic provider disabled: {} is not set",
                config.anthropic.api_key_env
            ),
        }

        match config.openai.resolve_api_key() {
            Some(key) => providers.push(Arc::new(OpenAiCompatibleProvider::with_options(
                key,
                &config.openai.base_url,
                config.openai.max_tokens,
                config.openai.temperature,
                timeout,
                retry,
            ))),
            None => debug!(
                "OpenAI provider disabled: {} is not set",
                config.openai.api_key_env
            ),
        }

        if providers.is_empty() {
            warn!(
                "No LLM provider configured; set {} or {} to enable draft, ask and chat",
                config.anthropic.api_key_env, config.openai.api_key_env
            );
        } else {
            info!(
                "LLM providers: {}",
                providers
                    .iter()
                    .map(|p| p.kind().as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Self::new(providers, config)
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Resolve the provider for `model`
    ///
    /// Routing priority:
    ///  1. explicit `[providers.routing]` entry for the model name
    ///  2. model family (claude → anthropic, gpt → openai)
    ///  3. the configured default provider
    ///  4. the first registered provider
    ///  5. `GatewayError::ModelNotAvailable` when none are registered
    fn resolve_provider(&self, model: &Model) -> Result<&dyn ProviderAdapter, GatewayError> {
        if let Some(&idx) = self.explicit_model_routing.get(model.as_str()) {
            return Ok(self.providers[idx].as_ref());
        }

        let inferred_kind = if model.is_claude() {
            Some(ProviderKind::Anthropic)
        } else if model.is_gpt() {
            Some(ProviderKind::OpenAi)
        } else {
            None
        };
        if let Some(kind) = inferred_kind
            && let Some(p) = self.providers.iter().find(|p| p.kind() == kind)
        {
            return Ok(p.as_ref());
        }

        if let Some(kind) = self.default_kind
            && let Some(p) = self.providers.iter().find(|p| p.kind() == kind)
        {
            return Ok(p.as_ref());
        }

        self.providers
            .first()
            .map(|p| p.as_ref())
            .ok_or_else(|| {
                GatewayError::ModelNotAvailable(format!(
                    "{model}: no LLM provider is configured (set an API key)"
                ))
            })
    }
}

#[async_trait]
impl LlmGateway for RoutingGateway {
    async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
        self.resolve_provider(model)?.create_session(model).await
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        self.resolve_provider(model)?
            .create_session_with_system_prompt(model, system_prompt)
            .await
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        let mut all_models = Vec::new();
        for provider in &self.providers {
            if let Ok(models) = provider.available_models().await {
                all_models.extend(models);
            }
        }
        Ok(all_models)
    }
}

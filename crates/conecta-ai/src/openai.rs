//! OpenAI adapter (chat completions).

use async_trait::async_trait;
use serde_json::json;

use crate::wire::{
    build_chat_completions_body, map_status_error, map_transport_error,
    parse_chat_completions_response,
};
use crate::{AiProvider, CallOverrides, ChatReply, Message, ProviderConfig};
use conecta_types::ConectaError;

const PROVIDER: &str = "openai";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// USD per million input tokens (GPT-4o list price).
const INPUT_PRICE_PER_MILLION: f64 = 5.0;
/// USD per million output tokens.
const OUTPUT_PRICE_PER_MILLION: f64 = 15.0;

#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: "https://api.openai.com".to_string(),
        }
    }

    pub fn from_env() -> conecta_types::Result<Self> {
        let key = std::env::var("OPENAI_API_KEY").map_err(|_| ConectaError::AuthError {
            provider: PROVIDER.into(),
        })?;
        Ok(Self::new(ProviderConfig::new(key, "gpt-4o")))
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn timeout(&self) -> std::time::Duration {
        self.config
            .timeout
            .unwrap_or(std::time::Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    fn build_request_body(
        &self,
        messages: &[Message],
        overrides: Option<&CallOverrides>,
    ) -> serde_json::Value {
        build_chat_completions_body(&self.config, messages, overrides)
    }
}

// ---------------------------------------------------------------------------
// AiProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn chat(
        &self,
        messages: &[Message],
        overrides: Option<&CallOverrides>,
    ) -> conecta_types::Result<ChatReply> {
        let body = self.build_request_body(messages, overrides);
        let timeout = self.timeout();

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, timeout.as_millis() as u64, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| map_transport_error(PROVIDER, timeout.as_millis() as u64, e))?;

        if !status.is_success() {
            return Err(map_status_error(PROVIDER, status.as_u16(), &text));
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| ConectaError::ProviderError {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                message: format!("failed to parse response JSON: {e}"),
                retryable: false,
            })?;

        Ok(parse_chat_completions_response(PROVIDER, &json))
    }

    async fn health_check(&self) -> bool {
        // Listing models verifies both connectivity and the API key without
        // spending completion tokens.
        let timeout = self.timeout();
        let result = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(timeout)
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::debug!(provider = PROVIDER, status = %resp.status(), "health check failed");
                false
            }
            Err(err) => {
                tracing::debug!(provider = PROVIDER, error = %err, "health check failed");
                false
            }
        }
    }

    fn estimate_cost(&self, messages: &[Message]) -> f64 {
        crate::provider::estimate_cost_usd(
            messages,
            INPUT_PRICE_PER_MILLION,
            OUTPUT_PRICE_PER_MILLION,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

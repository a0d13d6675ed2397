//! Groq adapter (OpenAI-compatible chat completions endpoint).
//!
//! Cheapest and fastest vendor in the fleet; the production routing table
//! points simple-tier traffic here.

use async_trait::async_trait;
use serde_json::json;

use crate::wire::{
    build_chat_completions_body, map_status_error, map_transport_error,
    parse_chat_completions_response,
};
use crate::{AiProvider, CallOverrides, ChatReply, Message, ProviderConfig};
use conecta_types::ConectaError;

const PROVIDER: &str = "groq";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug)]
pub struct GroqProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    base_url: String,
}

impl GroqProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: "https://api.groq.com/openai".to_string(),
        }
    }

    pub fn from_env() -> conecta_types::Result<Self> {
        let key = std::env::var("GROQ_API_KEY").map_err(|_| ConectaError::AuthError {
            provider: PROVIDER.into(),
        })?;
        Ok(Self::new(ProviderConfig::new(key, "llama-3.1-70b-versatile")))
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

    async fn post_chat(&self, body: serde_json::Value) -> conecta_types::Result<serde_json::Value> {
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

        serde_json::from_str(&text).map_err(|e| ConectaError::ProviderError {
            provider: PROVIDER.into(),
            status: status.as_u16(),
            message: format!("failed to parse response JSON: {e}"),
            retryable: false,
        })
    }
}

// ---------------------------------------------------------------------------
// AiProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl AiProvider for GroqProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn chat(
        &self,
        messages: &[Message],
        overrides: Option<&CallOverrides>,
    ) -> conecta_types::Result<ChatReply> {
        let body = self.build_request_body(messages, overrides);
        let json = self.post_chat(body).await?;
        Ok(parse_chat_completions_response(PROVIDER, &json))
    }

    async fn health_check(&self) -> bool {
        let probe = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": "ping" }],
            "max_tokens": 5,
        });
        match self.post_chat(probe).await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(provider = PROVIDER, error = %err, "health check failed");
                false
            }
        }
    }

    fn estimate_cost(&self, _messages: &[Message]) -> f64 {
        // Groq's open-model tiers are effectively free at portal volumes.
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

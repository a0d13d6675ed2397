//! Anthropic Claude adapter (messages API).
//!
//! The messages endpoint only accepts user/assistant turns; system content
//! is lifted into the top-level `system` field before the call.

use async_trait::async_trait;
use serde_json::json;

use crate::wire::{map_status_error, map_transport_error};
use crate::{AiProvider, CallOverrides, ChatReply, Message, ProviderConfig, Role};
use conecta_types::ConectaError;

const PROVIDER: &str = "claude";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// USD per million input tokens (Claude 3.5 Sonnet list price).
const INPUT_PRICE_PER_MILLION: f64 = 3.0;
/// USD per million output tokens.
const OUTPUT_PRICE_PER_MILLION: f64 = 15.0;

/// The messages API requires max_tokens; used when neither the config nor
/// the call supplies one.
const FALLBACK_MAX_TOKENS: u32 = 500;

#[derive(Debug)]
pub struct ClaudeProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    base_url: String,
}

impl ClaudeProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }

    pub fn from_env() -> conecta_types::Result<Self> {
        let key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| ConectaError::AuthError {
            provider: PROVIDER.into(),
        })?;
        Ok(Self::new(ProviderConfig::new(
            key,
            "claude-3-5-sonnet-20241022",
        )))
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
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let turns: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let model = overrides
            .and_then(|o| o.model.clone())
            .unwrap_or_else(|| self.config.model.clone());
        let max_tokens = overrides
            .and_then(|o| o.max_tokens)
            .or(self.config.max_tokens)
            .unwrap_or(FALLBACK_MAX_TOKENS);

        let mut body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": turns,
        });

        if !system.is_empty() {
            body["system"] = json!(system.join("\n"));
        }
        if let Some(temp) = overrides.and_then(|o| o.temperature).or(self.config.temperature) {
            body["temperature"] = json!(temp);
        }

        body
    }

    async fn post_messages(
        &self,
        body: serde_json::Value,
    ) -> conecta_types::Result<serde_json::Value> {
        let timeout = self.timeout();
        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
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

fn parse_response(body: &serde_json::Value) -> ChatReply {
    let content = body["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let input = body["usage"]["input_tokens"].as_u64();
    let output = body["usage"]["output_tokens"].as_u64();
    let tokens_used = match (input, output) {
        (Some(i), Some(o)) => Some(i + o),
        (Some(i), None) => Some(i),
        (None, Some(o)) => Some(o),
        (None, None) => None,
    };

    ChatReply {
        content,
        provider: PROVIDER.to_string(),
        model: body["model"].as_str().map(String::from),
        tokens_used,
        finish_reason: body["stop_reason"].as_str().map(normalize_finish_reason),
    }
}

fn normalize_finish_reason(raw: &str) -> String {
    match raw {
        "end_turn" | "stop_sequence" => "stop",
        "max_tokens" => "length",
        "refusal" => "filtered",
        other => other,
    }
    .to_string()
}

// ---------------------------------------------------------------------------
// AiProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl AiProvider for ClaudeProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn chat(
        &self,
        messages: &[Message],
        overrides: Option<&CallOverrides>,
    ) -> conecta_types::Result<ChatReply> {
        let body = self.build_request_body(messages, overrides);
        let json = self.post_messages(body).await?;
        Ok(parse_response(&json))
    }

    async fn health_check(&self) -> bool {
        let probe = json!({
            "model": self.config.model,
            "max_tokens": 10,
            "messages": [{ "role": "user", "content": "ping" }],
        });
        match self.post_messages(probe).await {
            Ok(_) => true,
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

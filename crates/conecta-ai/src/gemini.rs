//! Google Gemini adapter (generateContent).
//!
//! Gemini has no system role and calls the assistant role "model": system
//! messages are folded into user turns and roles are remapped before the
//! payload is built.

use async_trait::async_trait;
use serde_json::json;

use crate::wire::{map_status_error, map_transport_error};
use crate::{AiProvider, CallOverrides, ChatReply, Message, ProviderConfig, Role};
use conecta_types::ConectaError;

const PROVIDER: &str = "gemini";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// USD per million input tokens.
const INPUT_PRICE_PER_MILLION: f64 = 3.5;
/// USD per million output tokens.
const OUTPUT_PRICE_PER_MILLION: f64 = 10.5;

pub struct GeminiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    pub fn from_env() -> conecta_types::Result<Self> {
        let key = std::env::var("GOOGLE_API_KEY").map_err(|_| ConectaError::AuthError {
            provider: PROVIDER.into(),
        })?;
        Ok(Self::new(ProviderConfig::new(key, "gemini-2.5-flash")))
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
        let contents: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        // No system role upstream; instructions travel as
                        // user turns.
                        Role::System | Role::User => "user",
                        Role::Assistant => "model",
                    },
                    "parts": [{ "text": m.content }],
                })
            })
            .collect();

        let mut generation_config = json!({});
        if let Some(temp) = overrides.and_then(|o| o.temperature).or(self.config.temperature) {
            generation_config["temperature"] = json!(temp);
        }
        if let Some(max) = overrides.and_then(|o| o.max_tokens).or(self.config.max_tokens) {
            generation_config["maxOutputTokens"] = json!(max);
        }

        json!({
            "contents": contents,
            "generationConfig": generation_config,
        })
    }

    fn model(&self, overrides: Option<&CallOverrides>) -> String {
        overrides
            .and_then(|o| o.model.clone())
            .unwrap_or_else(|| self.config.model.clone())
    }

    async fn post_generate(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> conecta_types::Result<serde_json::Value> {
        let timeout = self.timeout();
        let resp = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .query(&[("key", self.config.api_key.as_str())])
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

fn parse_response(model: &str, body: &serde_json::Value) -> ChatReply {
    let candidate = &body["candidates"][0];
    let content = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    ChatReply {
        content,
        provider: PROVIDER.to_string(),
        model: Some(model.to_string()),
        tokens_used: body["usageMetadata"]["totalTokenCount"].as_u64(),
        finish_reason: candidate["finishReason"].as_str().map(normalize_finish_reason),
    }
}

fn normalize_finish_reason(raw: &str) -> String {
    match raw {
        "STOP" => "stop",
        "MAX_TOKENS" => "length",
        "SAFETY" | "PROHIBITED_CONTENT" => "filtered",
        other => other,
    }
    .to_string()
}

// ---------------------------------------------------------------------------
// AiProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn chat(
        &self,
        messages: &[Message],
        overrides: Option<&CallOverrides>,
    ) -> conecta_types::Result<ChatReply> {
        let model = self.model(overrides);
        let body = self.build_request_body(messages, overrides);
        let json = self.post_generate(&model, body).await?;
        Ok(parse_response(&model, &json))
    }

    async fn health_check(&self) -> bool {
        let probe = json!({
            "contents": [{ "role": "user", "parts": [{ "text": "ping" }] }],
            "generationConfig": { "maxOutputTokens": 5 },
        });
        match self.post_generate(&self.config.model, probe).await {
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

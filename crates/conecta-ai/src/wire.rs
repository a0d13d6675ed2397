//! Wire plumbing shared by the vendor adapters: HTTP error translation plus
//! the chat-completions request/response shape that Groq and OpenAI both
//! speak.

use serde_json::json;

use conecta_types::ConectaError;

use crate::{CallOverrides, ChatReply, Message, ProviderConfig, Role};

/// Pull the human-readable message out of a vendor error body, falling back
/// to the raw body.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// Map a non-success vendor status to a typed error.
pub(crate) fn map_status_error(provider: &str, status: u16, body: &str) -> ConectaError {
    match status {
        429 => {
            let retry_ms = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error"]["retry_after"].as_f64())
                .map(|s| (s * 1000.0) as u64)
                .unwrap_or(1000);
            ConectaError::RateLimited {
                provider: provider.to_string(),
                retry_after_ms: retry_ms,
            }
        }
        401 | 403 => ConectaError::AuthError {
            provider: provider.to_string(),
        },
        500..=599 => ConectaError::ProviderError {
            provider: provider.to_string(),
            status,
            message: extract_error_message(body),
            retryable: true,
        },
        _ => ConectaError::ProviderError {
            provider: provider.to_string(),
            status,
            message: extract_error_message(body),
            retryable: false,
        },
    }
}

/// Map a reqwest transport failure. Timeouts get their own variant so the
/// dispatcher's logs distinguish slow vendors from broken ones; both advance
/// the candidate sequence the same way.
pub(crate) fn map_transport_error(
    provider: &str,
    timeout_ms: u64,
    err: reqwest::Error,
) -> ConectaError {
    if err.is_timeout() {
        ConectaError::RequestTimeout {
            provider: provider.to_string(),
            timeout_ms,
        }
    } else {
        ConectaError::ProviderError {
            provider: provider.to_string(),
            status: 0,
            message: err.to_string(),
            retryable: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat-completions wire shape
// ---------------------------------------------------------------------------

pub(crate) fn build_chat_completions_body(
    config: &ProviderConfig,
    messages: &[Message],
    overrides: Option<&CallOverrides>,
) -> serde_json::Value {
    let wire_messages: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| {
            json!({
                "role": match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": m.content,
            })
        })
        .collect();

    let model = overrides
        .and_then(|o| o.model.clone())
        .unwrap_or_else(|| config.model.clone());

    let mut body = json!({
        "model": model,
        "messages": wire_messages,
    });

    if let Some(temp) = overrides.and_then(|o| o.temperature).or(config.temperature) {
        body["temperature"] = json!(temp);
    }
    if let Some(max) = overrides.and_then(|o| o.max_tokens).or(config.max_tokens) {
        body["max_tokens"] = json!(max);
    }

    body
}

pub(crate) fn parse_chat_completions_response(
    provider: &str,
    body: &serde_json::Value,
) -> ChatReply {
    let choice = &body["choices"][0];
    ChatReply {
        content: choice["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        provider: provider.to_string(),
        model: body["model"].as_str().map(String::from),
        tokens_used: body["usage"]["total_tokens"].as_u64(),
        finish_reason: choice["finish_reason"]
            .as_str()
            .map(normalize_finish_reason),
    }
}

/// Collapse the chat-completions finish vocabulary into the provider-agnostic
/// set used across the fleet.
pub(crate) fn normalize_finish_reason(raw: &str) -> String {
    match raw {
        "stop" => "stop",
        "length" => "length",
        "content_filter" => "filtered",
        other => other,
    }
    .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_message_from_error_body() {
        let msg = extract_error_message(r#"{"error": {"message": "invalid model"}}"#);
        assert_eq!(msg, "invalid model");
    }

    #[test]
    fn extract_message_falls_back_to_raw_body() {
        assert_eq!(extract_error_message("plain text"), "plain text");
    }

    #[test]
    fn status_429_maps_to_rate_limited() {
        let err = map_status_error(
            "groq",
            429,
            r#"{"error": {"message": "slow down", "retry_after": 3.0}}"#,
        );
        assert!(matches!(
            err,
            ConectaError::RateLimited {
                retry_after_ms: 3000,
                ..
            }
        ));
    }

    #[test]
    fn status_429_without_retry_hint_defaults_to_one_second() {
        let err = map_status_error("groq", 429, "{}");
        assert!(matches!(
            err,
            ConectaError::RateLimited {
                retry_after_ms: 1000,
                ..
            }
        ));
    }

    #[test]
    fn status_401_maps_to_auth_error() {
        let err = map_status_error("openai", 401, r#"{"error": {"message": "bad key"}}"#);
        assert!(matches!(err, ConectaError::AuthError { provider } if provider == "openai"));
    }

    #[test]
    fn status_5xx_is_retryable() {
        let err = map_status_error("gemini", 503, r#"{"error": {"message": "overloaded"}}"#);
        match err {
            ConectaError::ProviderError {
                retryable, status, ..
            } => {
                assert!(retryable);
                assert_eq!(status, 503);
            }
            other => panic!("expected ProviderError, got {other:?}"),
        }
    }

    #[test]
    fn status_400_is_not_retryable() {
        let err = map_status_error("claude", 400, r#"{"error": {"message": "bad request"}}"#);
        match err {
            ConectaError::ProviderError { retryable, .. } => assert!(!retryable),
            other => panic!("expected ProviderError, got {other:?}"),
        }
    }

    #[test]
    fn chat_completions_finish_reason_normalization() {
        assert_eq!(normalize_finish_reason("stop"), "stop");
        assert_eq!(normalize_finish_reason("length"), "length");
        assert_eq!(normalize_finish_reason("content_filter"), "filtered");
        assert_eq!(normalize_finish_reason("tool_calls"), "tool_calls");
    }
}

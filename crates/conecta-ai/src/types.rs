use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

/// Coarse difficulty tier of a conversation, used for routing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

// ---------------------------------------------------------------------------
// ChatReply
// ---------------------------------------------------------------------------

/// Normalized completion returned to the caller on a successful dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Provider-agnostic finish string ("stop", "length", "filtered", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// Per-vendor credentials and tuning. Opaque to the dispatcher.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: Some(0.7),
            max_tokens: Some(2000),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

// ---------------------------------------------------------------------------
// CallOverrides
// ---------------------------------------------------------------------------

/// Optional per-call overrides accepted by `AiProvider::chat`.
#[derive(Debug, Clone, Default)]
pub struct CallOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

// ---------------------------------------------------------------------------
// CustomerContext
// ---------------------------------------------------------------------------

/// Lightweight client context supplied by the portal layer. The dispatcher
/// forwards these fields verbatim into a system message and never interprets
/// their values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_invoices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_connections: Option<u32>,
}

impl CustomerContext {
    /// Render the context as a system message body. Field values are copied
    /// through untouched.
    pub fn to_system_prompt(&self) -> String {
        let mut lines = vec!["Contexto do cliente:".to_string()];
        if let Some(ref name) = self.name {
            lines.push(format!("- Nome: {name}"));
        }
        if let Some(ref email) = self.email {
            lines.push(format!("- Email: {email}"));
        }
        if let Some(n) = self.open_invoices {
            lines.push(format!("- Faturas em aberto: {n}"));
        }
        if let Some(n) = self.active_connections {
            lines.push(format!("- Conexões ativas: {n}"));
        }
        lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.open_invoices.is_none()
            && self.active_connections.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let msg = Message::system("Você é um atendente.");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "Você é um atendente.");

        let msg = Message::user("oi");
        assert_eq!(msg.role, Role::User);

        let msg = Message::assistant("Olá!");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );

        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn complexity_serialization() {
        assert_eq!(
            serde_json::to_string(&Complexity::Simple).unwrap(),
            "\"simple\""
        );
        assert_eq!(
            serde_json::to_string(&Complexity::Medium).unwrap(),
            "\"medium\""
        );
        assert_eq!(
            serde_json::to_string(&Complexity::Complex).unwrap(),
            "\"complex\""
        );
    }

    #[test]
    fn chat_reply_skips_absent_fields() {
        let reply = ChatReply {
            content: "Olá!".into(),
            provider: "groq".into(),
            model: None,
            tokens_used: None,
            finish_reason: None,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert!(json.get("model").is_none());
        assert!(json.get("tokens_used").is_none());
        assert!(json.get("finish_reason").is_none());
    }

    #[test]
    fn provider_config_defaults() {
        let cfg = ProviderConfig::new("key", "gpt-4o");
        assert_eq!(cfg.temperature, Some(0.7));
        assert_eq!(cfg.max_tokens, Some(2000));
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn customer_context_prompt_includes_only_present_fields() {
        let ctx = CustomerContext {
            name: Some("Maria".into()),
            email: None,
            open_invoices: Some(2),
            active_connections: None,
        };
        let prompt = ctx.to_system_prompt();
        assert!(prompt.contains("Nome: Maria"));
        assert!(prompt.contains("Faturas em aberto: 2"));
        assert!(!prompt.contains("Email"));
        assert!(!prompt.contains("Conexões"));
    }

    #[test]
    fn customer_context_is_empty() {
        assert!(CustomerContext::default().is_empty());
        let ctx = CustomerContext {
            open_invoices: Some(0),
            ..Default::default()
        };
        assert!(!ctx.is_empty());
    }
}

//! Shared types for the Conecta portal core.
//!
//! This crate provides the unified error taxonomy used across the AI
//! dispatch core, the proactive alert emitter, and the operator CLI:
//! - `ConectaError` — typed failures with vendor-safe caller messages
//! - `Result` — convenience alias

use serde::{Deserialize, Serialize};

/// One failed dispatch attempt, recorded for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub provider: String,
    pub cause: String,
}

/// Unified error type for all Conecta subsystems.
#[derive(Debug, thiserror::Error)]
pub enum ConectaError {
    // === Provider call errors ===
    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    RequestTimeout { provider: String, timeout_ms: u64 },

    // === Dispatch errors ===
    #[error("All AI providers failed after {} attempts", attempts.len())]
    AllProvidersFailed { attempts: Vec<AttemptFailure> },

    // === Registry errors ===
    #[error("Provider '{name}' is already registered")]
    DuplicateProvider { name: String },

    #[error("Provider '{name}' is not registered")]
    UnknownProvider { name: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ConectaError {
    /// Returns `true` if the error is transient and the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConectaError::RateLimited { .. }
                | ConectaError::RequestTimeout { .. }
                | ConectaError::ProviderError { retryable: true, .. }
        )
    }

    /// Returns `true` if the error is permanent and retrying will not help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConectaError::AuthError { .. }
                | ConectaError::DuplicateProvider { .. }
                | ConectaError::UnknownProvider { .. }
        )
    }

    /// Maps the error to an HTTP status code for the portal API layer.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ConectaError::RateLimited { .. } => Some(429),
            ConectaError::AuthError { .. } => Some(401),
            ConectaError::ProviderError { status, .. } => Some(*status),
            ConectaError::RequestTimeout { .. } => Some(504),
            ConectaError::AllProvidersFailed { .. } => Some(503),
            ConectaError::UnknownProvider { .. } => Some(404),
            _ => None,
        }
    }

    /// Caller-facing message. Never includes vendor identity, credentials,
    /// or raw upstream error text; full detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConectaError::AllProvidersFailed { .. } => {
                "Nosso assistente está temporariamente indisponível. Tente novamente em instantes."
            }
            ConectaError::UnknownProvider { .. } | ConectaError::DuplicateProvider { .. } => {
                "Configuração inválida. Contate o suporte."
            }
            _ => "Não foi possível concluir sua solicitação. Tente novamente.",
        }
    }
}

/// A convenience alias for `Result<T, ConectaError>`.
pub type Result<T> = std::result::Result<T, ConectaError>;

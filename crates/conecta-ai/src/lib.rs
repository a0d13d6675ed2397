//! Multi-provider AI dispatch core for the Conecta customer portal.
//!
//! Provides the `AiProvider` capability trait with one adapter per vendor
//! (Groq, Gemini, OpenAI, Claude), a provider registry with priority- and
//! tier-based routing metadata, the dispatch orchestrator with automatic
//! fallback, and a background health monitor that restores providers after
//! transient failures.

mod classifier;
mod claude;
mod gemini;
mod groq;
mod health;
mod openai;
mod orchestrator;
mod provider;
mod registry;
mod types;
mod wire;

pub use classifier::ClassifierRules;
pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use health::{probe_all, HealthMonitor, DEFAULT_PROBE_PERIOD};
pub use openai::OpenAiProvider;
pub use orchestrator::{AiOrchestrator, ChatOptions};
pub use provider::AiProvider;
pub use registry::{ProviderEntry, ProviderRegistry, ProviderStatus};
pub use types::*;

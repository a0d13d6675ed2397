//! Dispatch orchestrator: tier classification, priority-ordered candidate
//! selection, and first-success-wins fallback across the registered vendors.
//!
//! A failed attempt downgrades the provider's availability flag (a cheap
//! circuit-breaker approximation); the health monitor restores the flag once
//! the vendor is observed healthy again, so one blip does not permanently
//! exile a provider.

use std::sync::Arc;

use conecta_types::{AttemptFailure, ConectaError};

use crate::{
    CallOverrides, ChatReply, ClassifierRules, ClaudeProvider, Complexity, CustomerContext,
    GeminiProvider, GroqProvider, Message, OpenAiProvider, ProviderConfig, ProviderEntry,
    ProviderRegistry,
};

// ---------------------------------------------------------------------------
// ChatOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Attempt this provider first, regardless of tier eligibility, when it
    /// is enabled and currently marked available.
    pub preferred_provider: Option<String>,
    /// Skip classification and route with this tier.
    pub complexity: Option<Complexity>,
    /// Forwarded verbatim into a system message.
    pub customer: Option<CustomerContext>,
    /// Per-call tuning handed to whichever adapter ends up serving the
    /// request.
    pub overrides: Option<CallOverrides>,
}

// ---------------------------------------------------------------------------
// AiOrchestrator
// ---------------------------------------------------------------------------

pub struct AiOrchestrator {
    registry: Arc<ProviderRegistry>,
    rules: ClassifierRules,
}

impl AiOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            rules: ClassifierRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: ClassifierRules) -> Self {
        self.rules = rules;
        self
    }

    /// Build the production registry from environment variables. A vendor
    /// with no API key is simply not registered. The routing table mirrors
    /// the portal's: fast/cheap vendors serve simple queries, premium
    /// vendors serve complex ones.
    pub fn from_env() -> conecta_types::Result<Self> {
        let mut registry = ProviderRegistry::new();

        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            registry.register(
                Box::new(GroqProvider::new(ProviderConfig::new(
                    key,
                    "llama-3.1-70b-versatile",
                ))),
                1,
                Some(vec![Complexity::Simple]),
            )?;
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            registry.register(
                Box::new(GeminiProvider::new(ProviderConfig::new(
                    key,
                    "gemini-2.5-flash",
                ))),
                2,
                Some(vec![Complexity::Simple, Complexity::Medium]),
            )?;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            registry.register(
                Box::new(OpenAiProvider::new(ProviderConfig::new(key, "gpt-4o"))),
                3,
                Some(vec![Complexity::Medium, Complexity::Complex]),
            )?;
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            registry.register(
                Box::new(ClaudeProvider::new(ProviderConfig::new(
                    key,
                    "claude-3-5-sonnet-20241022",
                ))),
                4,
                Some(vec![Complexity::Complex]),
            )?;
        }

        if registry.is_empty() {
            return Err(ConectaError::Other(
                "No AI provider API keys found in environment".into(),
            ));
        }

        Ok(Self::new(Arc::new(registry)))
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Dispatch a conversation. Tries the preferred provider first (if any),
    /// then every tier-eligible candidate in priority order. The first
    /// success wins; each failure marks the provider unavailable and the
    /// next candidate is tried. Only total exhaustion surfaces to the
    /// caller.
    pub async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> conecta_types::Result<ChatReply> {
        let complexity = options
            .complexity
            .unwrap_or_else(|| self.rules.classify(messages));

        let payload = self.build_payload(messages, options);

        let mut attempts: Vec<AttemptFailure> = Vec::new();
        let mut attempted_preferred: Option<&str> = None;

        // 1. Preferred provider, independent of tier eligibility. On failure
        // fall through to the normal candidate sequence.
        if let Some(name) = options.preferred_provider.as_deref() {
            if let Some(entry) = self.registry.get(name) {
                if entry.is_enabled() && entry.is_available() {
                    tracing::info!(provider = %name, "attempting preferred provider");
                    attempted_preferred = Some(entry.name());
                    match self
                        .attempt(entry, &payload, options.overrides.as_ref(), &mut attempts)
                        .await
                    {
                        Some(reply) => return Ok(reply),
                        None => {
                            tracing::warn!(provider = %name, "preferred provider failed, falling back");
                        }
                    }
                }
            }
        }

        // 2. Tier-eligible candidates in priority order, skipping the
        // already-attempted preferred provider.
        for entry in self.registry.eligible_for(complexity) {
            if Some(entry.name()) == attempted_preferred {
                continue;
            }
            tracing::info!(provider = %entry.name(), complexity = ?complexity, "attempting provider");
            if let Some(reply) = self
                .attempt(entry, &payload, options.overrides.as_ref(), &mut attempts)
                .await
            {
                return Ok(reply);
            }
        }

        tracing::error!(attempted = attempts.len(), "all AI providers failed");
        Err(ConectaError::AllProvidersFailed { attempts })
    }

    /// One candidate attempt. On failure the provider is marked unavailable,
    /// the cause is recorded, and `None` advances the caller to the next
    /// candidate.
    async fn attempt(
        &self,
        entry: &ProviderEntry,
        payload: &[Message],
        overrides: Option<&CallOverrides>,
        attempts: &mut Vec<AttemptFailure>,
    ) -> Option<ChatReply> {
        match entry.adapter().chat(payload, overrides).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                tracing::warn!(provider = %entry.name(), error = %err, "provider call failed");
                self.registry.mark_unavailable(entry.name());
                attempts.push(AttemptFailure {
                    provider: entry.name().to_string(),
                    cause: err.to_string(),
                });
                None
            }
        }
    }

    /// The caller's conversation is never mutated; the vendor payload is a
    /// fresh vector with the customer context prepended as a system message.
    fn build_payload(&self, messages: &[Message], options: &ChatOptions) -> Vec<Message> {
        match &options.customer {
            Some(ctx) if !ctx.is_empty() => {
                let mut payload = Vec::with_capacity(messages.len() + 1);
                payload.push(Message::system(ctx.to_system_prompt()));
                payload.extend_from_slice(messages);
                payload
            }
            _ => messages.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

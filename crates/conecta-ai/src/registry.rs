//! Provider registry: routing metadata plus live availability for every
//! registered vendor adapter.
//!
//! The entry set is fixed once registration finishes (before the registry is
//! shared); after that only the two per-entry flags change. Both are plain
//! atomics so a failing dispatch flow and a concurrently completing health
//! probe can write without a lock. The flags are advisory and self-correct
//! on the next probe cycle, so last-writer-wins is fine.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use conecta_types::ConectaError;

use crate::{AiProvider, Complexity, Message};

// ---------------------------------------------------------------------------
// ProviderEntry
// ---------------------------------------------------------------------------

pub struct ProviderEntry {
    name: String,
    priority: u8,
    enabled: AtomicBool,
    available: AtomicBool,
    /// Tiers this provider should serve. `None` means every tier.
    use_for: Option<Vec<Complexity>>,
    adapter: Box<dyn AiProvider>,
}

impl ProviderEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    pub fn use_for(&self) -> Option<&[Complexity]> {
        self.use_for.as_deref()
    }

    pub fn adapter(&self) -> &dyn AiProvider {
        self.adapter.as_ref()
    }

    fn serves(&self, tier: Complexity) -> bool {
        match &self.use_for {
            Some(tiers) => tiers.contains(&tier),
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderStatus
// ---------------------------------------------------------------------------

/// Read-only status record for the observability surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: String,
    pub enabled: bool,
    pub available: bool,
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_for: Option<Vec<Complexity>>,
    pub estimated_cost_per_query: f64,
}

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

pub struct ProviderRegistry {
    /// Registration order is the priority tie-breaker, so entries stay in
    /// insertion order and eligibility sorting is stable.
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a provider with its routing metadata. New entries start enabled
    /// and available.
    pub fn register(
        &mut self,
        adapter: Box<dyn AiProvider>,
        priority: u8,
        use_for: Option<Vec<Complexity>>,
    ) -> conecta_types::Result<()> {
        let name = adapter.name().to_string();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(ConectaError::DuplicateProvider { name });
        }
        tracing::info!(provider = %name, priority, "provider registered");
        self.entries.push(ProviderEntry {
            name,
            priority,
            enabled: AtomicBool::new(true),
            available: AtomicBool::new(true),
            use_for,
            adapter,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Toggle operator control. Idempotent; unknown names are an error.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> conecta_types::Result<()> {
        let entry = self.get(name).ok_or_else(|| ConectaError::UnknownProvider {
            name: name.to_string(),
        })?;
        entry.enabled.store(enabled, Ordering::Relaxed);
        tracing::info!(provider = %name, enabled, "provider toggled");
        Ok(())
    }

    pub fn mark_available(&self, name: &str) {
        if let Some(entry) = self.get(name) {
            entry.available.store(true, Ordering::Relaxed);
        }
    }

    pub fn mark_unavailable(&self, name: &str) {
        if let Some(entry) = self.get(name) {
            entry.available.store(false, Ordering::Relaxed);
        }
    }

    /// Ordered candidate sequence for one tier: enabled, available, and
    /// either tier-eligible or unrestricted, sorted by priority with
    /// registration order breaking ties.
    pub fn eligible_for(&self, tier: Complexity) -> Vec<&ProviderEntry> {
        let mut candidates: Vec<&ProviderEntry> = self
            .entries
            .iter()
            .filter(|e| e.is_enabled() && e.is_available() && e.serves(tier))
            .collect();
        candidates.sort_by_key(|e| e.priority);
        candidates
    }

    /// Point-in-time status of every entry, including an advisory cost
    /// estimate for a one-message probe query.
    pub fn snapshot(&self) -> Vec<ProviderStatus> {
        let probe = [Message::user("teste")];
        self.entries
            .iter()
            .map(|e| ProviderStatus {
                name: e.name.clone(),
                enabled: e.is_enabled(),
                available: e.is_available(),
                priority: e.priority,
                use_for: e.use_for.clone(),
                estimated_cost_per_query: e.adapter.estimate_cost(&probe),
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallOverrides, ChatReply};
    use async_trait::async_trait;

    struct NamedMock(&'static str);

    #[async_trait]
    impl AiProvider for NamedMock {
        fn name(&self) -> &str {
            self.0
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _overrides: Option<&CallOverrides>,
        ) -> conecta_types::Result<ChatReply> {
            Ok(ChatReply {
                content: "ok".into(),
                provider: self.0.into(),
                model: None,
                tokens_used: None,
                finish_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn estimate_cost(&self, _messages: &[Message]) -> f64 {
            0.001
        }
    }

    fn portal_registry() -> ProviderRegistry {
        let mut reg = ProviderRegistry::new();
        reg.register(
            Box::new(NamedMock("groq")),
            1,
            Some(vec![Complexity::Simple]),
        )
        .unwrap();
        reg.register(
            Box::new(NamedMock("gemini")),
            2,
            Some(vec![Complexity::Simple, Complexity::Medium]),
        )
        .unwrap();
        reg.register(
            Box::new(NamedMock("openai")),
            3,
            Some(vec![Complexity::Medium, Complexity::Complex]),
        )
        .unwrap();
        reg
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = ProviderRegistry::new();
        reg.register(Box::new(NamedMock("groq")), 1, None).unwrap();
        let err = reg.register(Box::new(NamedMock("groq")), 2, None).unwrap_err();
        assert!(matches!(err, ConectaError::DuplicateProvider { name } if name == "groq"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn eligible_for_filters_by_tier_and_sorts_by_priority() {
        let reg = portal_registry();

        let simple: Vec<&str> = reg
            .eligible_for(Complexity::Simple)
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(simple, vec!["groq", "gemini"]);

        let complex: Vec<&str> = reg
            .eligible_for(Complexity::Complex)
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(complex, vec!["openai"]);
    }

    #[test]
    fn priority_ties_break_by_registration_order() {
        let mut reg = ProviderRegistry::new();
        reg.register(Box::new(NamedMock("b")), 1, None).unwrap();
        reg.register(Box::new(NamedMock("a")), 1, None).unwrap();
        let order: Vec<&str> = reg
            .eligible_for(Complexity::Medium)
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn no_use_for_means_every_tier() {
        let mut reg = ProviderRegistry::new();
        reg.register(Box::new(NamedMock("any")), 1, None).unwrap();
        for tier in [Complexity::Simple, Complexity::Medium, Complexity::Complex] {
            assert_eq!(reg.eligible_for(tier).len(), 1);
        }
    }

    #[test]
    fn disabled_provider_is_never_eligible() {
        let reg = portal_registry();
        reg.set_enabled("groq", false).unwrap();
        let simple: Vec<&str> = reg
            .eligible_for(Complexity::Simple)
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(simple, vec!["gemini"]);
    }

    #[test]
    fn unavailable_provider_is_skipped_until_marked_back() {
        let reg = portal_registry();
        reg.mark_unavailable("groq");
        assert_eq!(reg.eligible_for(Complexity::Simple).len(), 1);
        reg.mark_available("groq");
        assert_eq!(reg.eligible_for(Complexity::Simple).len(), 2);
    }

    #[test]
    fn set_enabled_is_idempotent() {
        let reg = portal_registry();
        reg.set_enabled("groq", true).unwrap();
        reg.set_enabled("groq", true).unwrap();
        assert!(reg.get("groq").unwrap().is_enabled());

        reg.set_enabled("groq", false).unwrap();
        reg.set_enabled("groq", false).unwrap();
        assert!(!reg.get("groq").unwrap().is_enabled());
    }

    #[test]
    fn set_enabled_unknown_provider_errors() {
        let reg = portal_registry();
        let err = reg.set_enabled("nope", true).unwrap_err();
        assert!(matches!(err, ConectaError::UnknownProvider { name } if name == "nope"));
    }

    #[test]
    fn snapshot_reflects_flags_and_costs() {
        let reg = portal_registry();
        reg.set_enabled("gemini", false).unwrap();
        reg.mark_unavailable("openai");

        let snap = reg.snapshot();
        assert_eq!(snap.len(), 3);

        let gemini = snap.iter().find(|s| s.name == "gemini").unwrap();
        assert!(!gemini.enabled);
        assert!(gemini.available);

        let openai = snap.iter().find(|s| s.name == "openai").unwrap();
        assert!(openai.enabled);
        assert!(!openai.available);
        assert!(openai.estimated_cost_per_query > 0.0);
    }

    #[test]
    fn marking_unknown_provider_is_a_no_op() {
        let reg = portal_registry();
        reg.mark_unavailable("nope");
        reg.mark_available("nope");
        assert_eq!(reg.snapshot().len(), 3);
    }
}

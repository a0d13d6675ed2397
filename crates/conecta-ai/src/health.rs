//! Periodic provider health monitoring.
//!
//! A single background task probes every enabled registry entry on a fixed
//! period and writes the shared availability flag. Probes run out of band
//! with dispatch flows and never block them. The task is owned by the
//! process lifecycle: started at init, stopped on graceful shutdown via a
//! watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ProviderRegistry;

/// Reference probe period of the production portal.
pub const DEFAULT_PROBE_PERIOD: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// probe_all
// ---------------------------------------------------------------------------

/// One probe pass over the registry. Disabled entries are skipped entirely
/// (no probe traffic). Availability transitions are logged; steady state is
/// not, to keep the logs quiet.
pub async fn probe_all(registry: &ProviderRegistry) {
    for entry in registry.entries() {
        if !entry.is_enabled() {
            continue;
        }

        let was_available = entry.is_available();
        let healthy = entry.adapter().health_check().await;

        if healthy && !was_available {
            tracing::info!(provider = %entry.name(), "provider recovered, marking available");
        } else if !healthy && was_available {
            tracing::warn!(provider = %entry.name(), "provider degraded, marking unavailable");
        }

        if healthy {
            registry.mark_available(entry.name());
        } else {
            registry.mark_unavailable(entry.name());
        }
    }
}

// ---------------------------------------------------------------------------
// HealthMonitor
// ---------------------------------------------------------------------------

pub struct HealthMonitor {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl HealthMonitor {
    /// Spawn the probe task. The first probe fires after one full period,
    /// not immediately: entries start optimistic and the first tick settles
    /// them.
    pub fn start(registry: Arc<ProviderRegistry>, period: Duration) -> Self {
        let (shutdown, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; consume it so
            // the loop waits a full period before the first probe.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::debug!("running provider health checks");
                        probe_all(&registry).await;
                    }
                    changed = stopped.changed() => {
                        match changed {
                            // Sender gone: the monitor handle was dropped
                            // without stop(), shut the task down too.
                            Err(_) => break,
                            Ok(()) if *stopped.borrow() => break,
                            Ok(()) => {}
                        }
                    }
                }
            }
        });
        Self { handle, shutdown }
    }

    /// Signal the probe task and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        tracing::info!("health monitor stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AiProvider, CallOverrides, ChatReply, Message};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct ProbeMock {
        name: &'static str,
        healthy: Arc<AtomicBool>,
        probes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AiProvider for ProbeMock {
        fn name(&self) -> &str {
            self.name
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _overrides: Option<&CallOverrides>,
        ) -> conecta_types::Result<ChatReply> {
            Ok(ChatReply {
                content: "ok".into(),
                provider: self.name.into(),
                model: None,
                tokens_used: None,
                finish_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.healthy.load(Ordering::SeqCst)
        }

        fn estimate_cost(&self, _messages: &[Message]) -> f64 {
            0.0
        }
    }

    fn probe_registry(
        name: &'static str,
    ) -> (ProviderRegistry, Arc<AtomicBool>, Arc<AtomicUsize>) {
        let healthy = Arc::new(AtomicBool::new(true));
        let probes = Arc::new(AtomicUsize::new(0));
        let mut registry = ProviderRegistry::new();
        registry
            .register(
                Box::new(ProbeMock {
                    name,
                    healthy: healthy.clone(),
                    probes: probes.clone(),
                }),
                1,
                None,
            )
            .unwrap();
        (registry, healthy, probes)
    }

    #[tokio::test]
    async fn probe_flips_unavailable_provider_back() {
        let (registry, healthy, _) = probe_registry("groq");
        registry.mark_unavailable("groq");
        assert!(!registry.get("groq").unwrap().is_available());

        healthy.store(true, Ordering::SeqCst);
        probe_all(&registry).await;
        assert!(registry.get("groq").unwrap().is_available());
    }

    #[tokio::test]
    async fn failed_probe_marks_provider_unavailable() {
        let (registry, healthy, _) = probe_registry("groq");
        healthy.store(false, Ordering::SeqCst);
        probe_all(&registry).await;
        assert!(!registry.get("groq").unwrap().is_available());
    }

    #[tokio::test]
    async fn disabled_providers_are_not_probed() {
        let (registry, _, probes) = probe_registry("groq");
        registry.set_enabled("groq", false).unwrap();
        probe_all(&registry).await;
        assert_eq!(probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn monitor_probes_periodically_and_stops_cleanly() {
        let (registry, _, probes) = probe_registry("groq");
        let registry = Arc::new(registry);

        let monitor = HealthMonitor::start(registry.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(55)).await;
        monitor.stop().await;

        let count = probes.load(Ordering::SeqCst);
        assert!(count >= 2, "expected at least two probes, got {count}");

        // No further probes after stop.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(probes.load(Ordering::SeqCst), count);
    }

    #[tokio::test]
    async fn dropped_monitor_stops_probing() {
        let (registry, _, probes) = probe_registry("groq");
        let monitor = HealthMonitor::start(Arc::new(registry), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(35)).await;
        drop(monitor);

        // Give an in-flight tick time to drain, then the count must freeze.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let count = probes.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(probes.load(Ordering::SeqCst), count);
    }

    #[tokio::test]
    async fn recovery_does_not_require_a_dispatch() {
        let (registry, healthy, _) = probe_registry("groq");
        let registry = Arc::new(registry);
        registry.mark_unavailable("groq");
        healthy.store(true, Ordering::SeqCst);

        let monitor = HealthMonitor::start(registry.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(40)).await;
        monitor.stop().await;

        assert!(registry.get("groq").unwrap().is_available());
    }
}

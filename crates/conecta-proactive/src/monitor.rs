//! Periodic polling of the collaborator feeds with broadcast fan-out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::{
    Alert, AlertAction, AlertKind, AlertPriority, BillingFeed, DueBill, MaintenanceFeed,
    MaintenanceWindow, NetworkFeed, NetworkIssue,
};

// ---------------------------------------------------------------------------
// MonitorPeriods
// ---------------------------------------------------------------------------

/// Polling periods per feed. Defaults mirror the production portal.
#[derive(Debug, Clone)]
pub struct MonitorPeriods {
    pub network: Duration,
    pub billing: Duration,
    pub maintenance: Duration,
}

impl Default for MonitorPeriods {
    fn default() -> Self {
        Self {
            network: Duration::from_secs(60),
            billing: Duration::from_secs(3600),
            maintenance: Duration::from_secs(12 * 3600),
        }
    }
}

// ---------------------------------------------------------------------------
// Alert conversion
// ---------------------------------------------------------------------------

pub(crate) fn network_alert(issue: &NetworkIssue) -> Alert {
    Alert::new(
        &issue.customer_id,
        AlertKind::NetworkIssue,
        AlertPriority::High,
        format!(
            "Detectamos instabilidade na sua região. Nossos técnicos já estão trabalhando nisso. \
             Previsão de normalização: {}",
            issue.eta
        ),
    )
    .with_actions(vec![
        AlertAction::new("open_ticket", "Abrir Chamado"),
        AlertAction::new("view_status", "Ver Status"),
    ])
}

pub(crate) fn bill_alert(bill: &DueBill) -> Alert {
    Alert::new(
        &bill.customer_id,
        AlertKind::BillReminder,
        AlertPriority::Medium,
        format!(
            "Sua fatura de R$ {} vence em {} dias.",
            bill.amount, bill.days_until_due
        ),
    )
    .with_actions(vec![
        AlertAction::new("view_bill", "Ver Fatura"),
        AlertAction::new("pay_now", "Pagar Agora"),
    ])
}

pub(crate) fn maintenance_alert(window: &MaintenanceWindow) -> Alert {
    Alert::new(
        &window.customer_id,
        AlertKind::Maintenance,
        AlertPriority::Low,
        format!(
            "Manutenção programada em sua região em {}. Pode haver interrupção breve.",
            window.date.format("%d/%m/%Y %H:%M")
        ),
    )
}

// ---------------------------------------------------------------------------
// ProactiveMonitor
// ---------------------------------------------------------------------------

pub struct ProactiveMonitor {
    sender: broadcast::Sender<Alert>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ProactiveMonitor {
    /// Spawn one polling task per feed. Alerts published while no session is
    /// subscribed are dropped, matching broadcast semantics.
    pub fn start(
        network: Arc<dyn NetworkFeed>,
        billing: Arc<dyn BillingFeed>,
        maintenance: Arc<dyn MaintenanceFeed>,
        periods: MonitorPeriods,
    ) -> Self {
        let (sender, _) = broadcast::channel(256);
        let (shutdown, _) = watch::channel(false);

        let tasks = vec![
            spawn_poller(periods.network, shutdown.subscribe(), {
                let sender = sender.clone();
                move || {
                    let network = network.clone();
                    let sender = sender.clone();
                    async move {
                        match network.current_issues().await {
                            Ok(issues) => {
                                for issue in &issues {
                                    publish(&sender, network_alert(issue));
                                }
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "network feed poll failed");
                            }
                        }
                    }
                }
            }),
            spawn_poller(periods.billing, shutdown.subscribe(), {
                let sender = sender.clone();
                move || {
                    let billing = billing.clone();
                    let sender = sender.clone();
                    async move {
                        match billing.due_bills().await {
                            Ok(bills) => {
                                for bill in &bills {
                                    publish(&sender, bill_alert(bill));
                                }
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "billing feed poll failed");
                            }
                        }
                    }
                }
            }),
            spawn_poller(periods.maintenance, shutdown.subscribe(), {
                let sender = sender.clone();
                move || {
                    let maintenance = maintenance.clone();
                    let sender = sender.clone();
                    async move {
                        match maintenance.scheduled_windows().await {
                            Ok(windows) => {
                                for window in &windows {
                                    publish(&sender, maintenance_alert(window));
                                }
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "maintenance feed poll failed");
                            }
                        }
                    }
                }
            }),
        ];

        tracing::info!("proactive monitor started");
        Self {
            sender,
            shutdown,
            tasks,
        }
    }

    /// Subscribe to the alert stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.sender.subscribe()
    }

    /// Signal every polling task and wait for them to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
        tracing::info!("proactive monitor stopped");
    }
}

fn publish(sender: &broadcast::Sender<Alert>, alert: Alert) {
    tracing::info!(
        customer = %alert.customer_id,
        kind = ?alert.kind,
        "emitting proactive alert"
    );
    let _ = sender.send(alert);
}

/// Generic poll loop: one feed, one period, stopping on the shutdown signal.
/// The first poll fires after a full period.
fn spawn_poller<F, Fut>(
    period: Duration,
    mut stopped: watch::Receiver<bool>,
    mut poll: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => poll().await,
                changed = stopped.changed() => {
                    match changed {
                        // Sender gone: the monitor was dropped without
                        // stop(), shut the poller down too.
                        Err(_) => break,
                        Ok(()) if *stopped.borrow() => break,
                        Ok(()) => {}
                    }
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

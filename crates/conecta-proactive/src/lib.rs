//! Proactive customer alert emitter.
//!
//! Polls collaborator systems (network status, billing due dates, scheduled
//! maintenance) on independent periods and publishes per-customer [`Alert`]s
//! over a [`tokio::sync::broadcast`] channel. The transport layer subscribes
//! and fans alerts out to connected sessions; this crate never talks to
//! customers directly. Feed errors are logged and skipped, never fatal.

mod alert;
mod feeds;
mod monitor;

pub use alert::{Alert, AlertAction, AlertKind, AlertPriority};
pub use feeds::{
    BillingFeed, DueBill, MaintenanceFeed, MaintenanceWindow, NetworkFeed, NetworkIssue,
};
pub use monitor::{MonitorPeriods, ProactiveMonitor};

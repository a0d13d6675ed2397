//! Collaborator feeds the monitor polls. The real implementations live in
//! the ERP integration layer; this crate only depends on the contracts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feed records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkIssue {
    pub customer_id: String,
    /// Human-readable normalization estimate, shown verbatim to the customer.
    pub eta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueBill {
    pub customer_id: String,
    pub amount: String,
    pub days_until_due: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub customer_id: String,
    pub date: chrono::DateTime<chrono::Utc>,
}

// ---------------------------------------------------------------------------
// Feed contracts
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NetworkFeed: Send + Sync {
    async fn current_issues(&self) -> conecta_types::Result<Vec<NetworkIssue>>;
}

#[async_trait]
pub trait BillingFeed: Send + Sync {
    async fn due_bills(&self) -> conecta_types::Result<Vec<DueBill>>;
}

#[async_trait]
pub trait MaintenanceFeed: Send + Sync {
    async fn scheduled_windows(&self) -> conecta_types::Result<Vec<MaintenanceWindow>>;
}

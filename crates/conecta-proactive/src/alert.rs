use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AlertKind / AlertPriority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    NetworkIssue,
    BillReminder,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
}

// ---------------------------------------------------------------------------
// AlertAction
// ---------------------------------------------------------------------------

/// Suggested follow-up the UI renders as a button next to the alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
}

impl AlertAction {
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub customer_id: String,
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AlertAction>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Alert {
    pub fn new(
        customer_id: impl Into<String>,
        kind: AlertKind,
        priority: AlertPriority,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: customer_id.into(),
            kind,
            priority,
            message: message.into(),
            actions: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<AlertAction>) -> Self {
        self.actions = actions;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Contracts for the external collaborators the workflows depend on: the
//! storage layer and the notification delivery channel.

use serde::{Deserialize, Serialize};

use super::identity::UserId;

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Notification categories understood by the delivery channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Success,
    ApplicationUpdate,
    Alert,
}

impl NotificationCategory {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationCategory::Success => "success",
            NotificationCategory::ApplicationUpdate => "application_update",
            NotificationCategory::Alert => "alert",
        }
    }
}

/// Payload handed to the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_link: Option<String>,
    pub also_email: bool,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification channel unavailable: {0}")]
    Channel(String),
}

/// Outbound notification hook (socket broadcast, e-mail fan-out). Dispatch is
/// best-effort: callers log failures and never let them affect the
/// triggering operation.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Lifecycle and general status messages.
    Info,
    Error,
    /// Aggregate count summaries.
    InventoryUpdate,
    /// Per-item detail messages.
    NewItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, body)
    }

    pub fn inventory_update(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationKind::InventoryUpdate, title, body)
    }

    pub fn new_item(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationKind::NewItem, title, body)
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

/// Trait for implementing delivery channels (Telegram, Pushover, etc.)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;
    fn description(&self) -> &str;

    /// Deliver one notification. Failures are reported, never retried here.
    async fn send(&self, notification: &Notification) -> Result<NotificationResult, AppError>;

    /// Plugin lifecycle
    async fn shutdown(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Best-effort sink used by the poll loop.
///
/// Implementations swallow and log delivery failures; nothing here can fail a cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, notification: Notification);

    async fn notify(&self, title: &str, body: &str) {
        self.dispatch(Notification::info(title, body)).await
    }

    async fn notify_error(&self, title: &str, body: &str) {
        self.dispatch(Notification::error(title, body)).await
    }
}

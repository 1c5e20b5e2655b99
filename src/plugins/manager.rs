use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::notifiers::pushover::{PushoverConfig, PushoverNotifier};
use super::notifiers::telegram::{TelegramConfig, TelegramNotifier};
use super::traits::{Notification, Notifier, NotifierPlugin};
use crate::config::NotificationsConfig;
use crate::utils::error::AppError;

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Fans each notification out to every registered delivery channel.
#[derive(Clone)]
pub struct NotifierManager {
    notifiers: Arc<RwLock<HashMap<String, NotifierPluginBox>>>,
}

impl NotifierManager {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a manager with every channel whose credentials are configured.
    pub async fn from_config(config: &NotificationsConfig) -> Result<Self, AppError> {
        let manager = Self::new();

        match TelegramConfig::from_settings(&config.telegram) {
            Some(telegram) => {
                manager
                    .register_notifier(Box::new(TelegramNotifier::new(telegram)?))
                    .await?
            }
            None => tracing::warn!(
                "Telegram credentials missing (bot_token and chat_id), Telegram notifications disabled"
            ),
        }

        match PushoverConfig::from_settings(&config.pushover) {
            Some(pushover) => {
                manager
                    .register_notifier(Box::new(PushoverNotifier::new(pushover)?))
                    .await?
            }
            None => tracing::debug!("Pushover credentials not configured"),
        }

        if manager.list_notifier_types().await.is_empty() {
            tracing::warn!("No notifiers configured; notifications will only be logged");
        }

        Ok(manager)
    }

    /// Register a notifier plugin
    pub async fn register_notifier(&self, plugin: NotifierPluginBox) -> Result<(), AppError> {
        let plugin_type = plugin.plugin_type().to_string();
        tracing::info!("Registered notifier: {}", plugin.name());

        let mut notifiers = self.notifiers.write().await;
        notifiers.insert(plugin_type, plugin);
        Ok(())
    }

    /// Check if a notifier plugin exists
    pub async fn has_notifier(&self, plugin_type: &str) -> bool {
        let notifiers = self.notifiers.read().await;
        notifiers.contains_key(plugin_type)
    }

    /// List all available notifier types
    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        notifiers.keys().cloned().collect()
    }

    /// Send a notification through every registered notifier.
    ///
    /// Returns how many channels accepted it. Per-channel failures are logged.
    pub async fn send_notification(&self, notification: &Notification) -> usize {
        let notifiers = self.notifiers.read().await;
        if notifiers.is_empty() {
            tracing::info!("[{}] {}", notification.title, notification.body);
            return 0;
        }

        let mut delivered = 0;
        for (plugin_type, notifier) in notifiers.iter() {
            match notifier.send(notification).await {
                Ok(result) if result.success => {
                    delivered += 1;
                    metrics::counter!("watcher_notifications_sent_total").increment(1);
                }
                Ok(result) => {
                    metrics::counter!("watcher_notifications_failed_total").increment(1);
                    tracing::error!(
                        "Notifier {} rejected '{}': {}",
                        plugin_type,
                        notification.title,
                        result.error.unwrap_or_default()
                    );
                }
                Err(e) => {
                    metrics::counter!("watcher_notifications_failed_total").increment(1);
                    tracing::error!(
                        "Notifier {} failed to send '{}': {}",
                        plugin_type,
                        notification.title,
                        e
                    );
                }
            }
        }
        delivered
    }

    /// Shutdown all plugins
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut notifiers = self.notifiers.write().await;
        for (_, plugin) in notifiers.drain() {
            if let Err(e) = plugin.shutdown().await {
                tracing::warn!("Error shutting down notifier plugin: {}", e);
            }
        }

        Ok(())
    }
}

impl Default for NotifierManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifierManager {
    async fn dispatch(&self, notification: Notification) {
        self.send_notification(&notification).await;
    }
}

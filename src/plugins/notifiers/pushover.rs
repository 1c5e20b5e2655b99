use crate::plugins::traits::{Notification, NotificationResult, NotifierPlugin};
use crate::utils::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Clone)]
pub struct PushoverConfig {
    pub user_key: String,
    pub app_token: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl PushoverConfig {
    pub fn from_settings(settings: &crate::config::PushoverConfig) -> Option<Self> {
        let user_key = settings.user_key.as_deref().filter(|s| !s.trim().is_empty())?;
        let app_token = settings.app_token.as_deref().filter(|s| !s.trim().is_empty())?;

        Some(PushoverConfig {
            user_key: user_key.to_string(),
            app_token: app_token.to_string(),
            api_url: settings.api_url.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }
}

pub struct PushoverNotifier {
    client: Client,
    config: PushoverConfig,
}

impl PushoverNotifier {
    pub fn new(config: PushoverConfig) -> Result<Self, AppError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(PushoverNotifier { client, config })
    }

    // Errors go out as emergency-ish alerts with a siren.
    fn priority_and_sound(&self, notification: &Notification) -> (&'static str, &'static str) {
        if notification.is_error() {
            ("2", "siren")
        } else {
            ("1", "cosmic")
        }
    }

    fn build_form(&self, notification: &Notification) -> Vec<(&'static str, String)> {
        let (priority, sound) = self.priority_and_sound(notification);
        vec![
            ("token", self.config.app_token.clone()),
            ("user", self.config.user_key.clone()),
            ("title", notification.title.clone()),
            ("message", notification.body.clone()),
            ("priority", priority.to_string()),
            ("sound", sound.to_string()),
        ]
    }
}

#[async_trait]
impl NotifierPlugin for PushoverNotifier {
    fn name(&self) -> &str {
        "Pushover Notifier"
    }

    fn plugin_type(&self) -> &str {
        "pushover"
    }

    fn description(&self) -> &str {
        "Sends push notifications through the Pushover messages API"
    }

    async fn send(&self, notification: &Notification) -> Result<NotificationResult, AppError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .form(&self.build_form(notification))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification {
                notifier: self.plugin_type().to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let message_id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["request"].as_str().map(str::to_string));

        tracing::info!("Pushover notification sent: {}", notification.title);
        Ok(NotificationResult {
            success: true,
            message_id,
            error: None,
        })
    }
}

use crate::plugins::traits::{Notification, NotificationKind, NotificationResult, NotifierPlugin};
use crate::utils::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn from_settings(settings: &crate::config::TelegramConfig) -> Option<Self> {
        let bot_token = settings.bot_token.as_deref().filter(|s| !s.trim().is_empty())?;
        let chat_id = settings.chat_id.as_deref().filter(|s| !s.trim().is_empty())?;

        Some(TelegramConfig {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }
}

pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, AppError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(TelegramNotifier { client, config })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.config.api_base, self.config.bot_token)
    }

    /// Status messages use Markdown with an emoji prefix; inventory messages go
    /// out as plain text so listing links get a preview.
    fn build_form(&self, notification: &Notification) -> Vec<(&'static str, String)> {
        let mut form = vec![("chat_id", self.config.chat_id.clone())];

        match notification.kind {
            NotificationKind::Info | NotificationKind::Error => {
                let icon = if notification.is_error() { "🚨" } else { "🔔" };
                form.push((
                    "text",
                    format!(
                        "{} *{}*\n\n{}",
                        icon,
                        escape_markdown(&notification.title),
                        escape_markdown(&notification.body)
                    ),
                ));
                form.push(("parse_mode", "Markdown".to_string()));
                form.push(("disable_web_page_preview", "true".to_string()));
            }
            NotificationKind::InventoryUpdate | NotificationKind::NewItem => {
                form.push((
                    "text",
                    format!("{}\n\n{}", notification.title, notification.body),
                ));
                form.push(("disable_web_page_preview", "false".to_string()));
            }
        }

        form
    }
}

/// Escapes the entity characters of Telegram's legacy Markdown so free text
/// (error messages, URLs) cannot open an unterminated entity.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    fn description(&self) -> &str {
        "Sends messages to a Telegram chat through the Bot API"
    }

    async fn send(&self, notification: &Notification) -> Result<NotificationResult, AppError> {
        let form = self.build_form(notification);
        let response = self
            .client
            .post(self.send_message_url())
            .form(&form)
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
            .and_then(|body| body["result"]["message_id"].as_i64())
            .map(|id| id.to_string());

        tracing::info!("Telegram notification sent: {}", notification.title);
        Ok(NotificationResult {
            success: true,
            message_id,
            error: None,
        })
    }
}

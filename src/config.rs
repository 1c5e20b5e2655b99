use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;
use validator::Validate;

use crate::core::active_hours::{ActiveHours, parse_time, parse_timezone};
use crate::plugins::notifiers::{pushover, telegram};
use crate::source::http::{DEFAULT_BASE_URL, DEFAULT_LISTING_BASE_URL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub poller: PollerConfig,
    pub inventory: InventoryConfig,
    pub store: StoreConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PollerConfig {
    #[validate(range(min = 1, max = 86400))]
    pub interval_secs: u64,
    pub active_start: Option<String>,
    pub active_end: Option<String>,
    /// IANA zone for the active-hours window; the host zone when unset.
    pub timezone: Option<String>,
    #[validate(range(min = 1))]
    pub error_notification_interval_mins: u64,
    pub notify_on_recovery: bool,
    #[validate(range(min = 1, max = 3600))]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InventoryConfig {
    pub base_url: String,
    pub listing_base_url: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(length(min = 1))]
    pub condition: String,
    #[validate(length(min = 2))]
    pub market: String,
    #[validate(length(min = 2))]
    pub language: String,
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub referer: String,
    pub proxies: Vec<String>,
    pub proxy_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    #[validate(length(min = 1))]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub telegram: TelegramConfig,
    pub pushover: PushoverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushoverConfig {
    pub user_key: Option<String>,
    pub app_token: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Flat variables still honored from older deployments, mapped onto config keys.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("BOT_ACTIVE_START", "poller.active_start"),
    ("BOT_ACTIVE_END", "poller.active_end"),
    ("TESLA_MARKET", "inventory.market"),
    ("TESLA_LANGUAGE", "inventory.language"),
    ("TELEGRAM_BOT_TOKEN", "notifications.telegram.bot_token"),
    ("TELEGRAM_CHAT_ID", "notifications.telegram.chat_id"),
    ("PUSHOVER_USER_KEY", "notifications.pushover.user_key"),
    ("PUSHOVER_APP_TOKEN", "notifications.pushover.app_token"),
];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Defaults
            .set_default("poller.interval_secs", 10)?
            .set_default("poller.error_notification_interval_mins", 30)?
            .set_default("poller.notify_on_recovery", false)?
            .set_default("poller.shutdown_timeout_secs", 60)?
            .set_default("inventory.base_url", DEFAULT_BASE_URL)?
            .set_default("inventory.listing_base_url", DEFAULT_LISTING_BASE_URL)?
            .set_default("inventory.model", "my")?
            .set_default("inventory.condition", "new")?
            .set_default("inventory.market", "DE")?
            .set_default("inventory.language", "de")?
            .set_default("inventory.page_size", 24)?
            .set_default("inventory.request_timeout_secs", 60)?
            .set_default(
                "inventory.user_agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
            )?
            .set_default("inventory.referer", "https://www.tesla.com/inventory/new/my")?
            .set_default("inventory.proxies", Vec::<String>::new())?
            .set_default("store.path", "sent_ids.txt")?
            .set_default("notifications.telegram.api_base", telegram::DEFAULT_API_BASE)?
            .set_default("notifications.telegram.timeout_secs", 30)?
            .set_default("notifications.pushover.api_url", pushover::DEFAULT_API_URL)?
            .set_default("notifications.pushover.timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.port", 9001)?
            // Optional config file in the working directory
            .add_source(File::with_name("config/default").required(false));

        // Explicit config file from the command line
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Add environment variables with prefix "WATCHER"
        builder = builder.add_source(
            Environment::with_prefix("WATCHER")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("inventory.proxies"),
        );

        for (var, key) in LEGACY_ENV_OVERRIDES {
            let value = env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.poller.validate().map_err(invalid("poller"))?;
        self.inventory.validate().map_err(invalid("inventory"))?;
        self.store.validate().map_err(invalid("store"))?;

        // Active hours need both ends
        self.poller
            .active_hours()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        if Url::parse(&self.inventory.base_url).is_err() {
            return Err(ConfigError::Message("Invalid inventory base_url format".into()));
        }

        if Url::parse(&self.inventory.listing_base_url).is_err() {
            return Err(ConfigError::Message(
                "Invalid inventory listing_base_url format".into(),
            ));
        }

        if Url::parse(&self.notifications.telegram.api_base).is_err() {
            return Err(ConfigError::Message("Invalid Telegram api_base format".into()));
        }

        if Url::parse(&self.notifications.pushover.api_url).is_err() {
            return Err(ConfigError::Message("Invalid Pushover api_url format".into()));
        }

        if self.notifications.telegram.timeout_secs == 0
            || self.notifications.pushover.timeout_secs == 0
        {
            return Err(ConfigError::Message(
                "Notifier timeout_secs must be greater than 0".into(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Message(format!(
                "Logging level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn error_notification_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.error_notification_interval_mins as i64)
    }

    pub fn timezone(&self) -> crate::Result<Option<chrono_tz::Tz>> {
        self.timezone.as_deref().map(parse_timezone).transpose()
    }

    /// Parsed active-hours window, `None` when polling runs around the clock.
    pub fn active_hours(&self) -> crate::Result<Option<ActiveHours>> {
        let timezone = self.timezone()?;
        match (self.active_start.as_deref(), self.active_end.as_deref()) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Ok(Some(
                ActiveHours::new(parse_time(start)?, parse_time(end)?).with_timezone(timezone),
            )),
            _ => Err(crate::AppError::Validation(
                "Active hours need both active_start and active_end".into(),
            )),
        }
    }
}

fn invalid(section: &'static str) -> impl Fn(validator::ValidationErrors) -> ConfigError {
    move |errors| ConfigError::Message(format!("Invalid {} configuration: {}", section, errors))
}

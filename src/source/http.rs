use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, REFERER, USER_AGENT};
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::InventorySource;
use super::parser::parse_snapshot;
use super::proxy::ConnectionStrategy;
use crate::config::InventoryConfig;
use crate::models::Snapshot;
use crate::utils::error::{AppError, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.tesla.com/coinorder/api/v4/inventory-results";
pub const DEFAULT_LISTING_BASE_URL: &str = "https://www.tesla.com";

/// Inventory search over HTTP, one fresh client per request so each
/// request can go through a different proxy.
pub struct HttpInventorySource {
    config: InventoryConfig,
    connection: Box<dyn ConnectionStrategy>,
}

impl HttpInventorySource {
    pub fn new(config: InventoryConfig, connection: Box<dyn ConnectionStrategy>) -> Self {
        tracing::info!(
            "Inventory source: market={}, language={}, model={}, connection={}",
            config.market,
            config.language,
            config.model,
            connection.describe()
        );
        Self { config, connection }
    }

    pub fn super_region(market: &str) -> &'static str {
        match market.to_ascii_uppercase().as_str() {
            "US" | "CA" => "north america",
            _ => "europe",
        }
    }

    pub fn query_document(&self) -> serde_json::Value {
        json!({
            "query": {
                "model": self.config.model,
                "condition": self.config.condition,
                "options": {},
                "arrangeby": "Price",
                "order": "asc",
                "market": self.config.market,
                "language": self.config.language,
                "super_region": Self::super_region(&self.config.market),
                "lng": "",
                "lat": "",
                "zip": "",
                "range": 0
            },
            "offset": 0,
            "count": self.config.page_size,
            "outsideOffset": 0,
            "outsideSearch": false,
            "isFalconDeliverySelectionEnabled": true,
            "version": "v2"
        })
    }

    pub fn request_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            AppError::Validation(format!("Invalid inventory base_url '{}': {}", self.config.base_url, e))
        })?;
        url.query_pairs_mut()
            .append_pair("query", &self.query_document().to_string());
        Ok(url)
    }

    /// Public page for a listing, e.g. `https://www.tesla.com/de_DE/my/order/<VIN>`.
    pub fn listing_link(&self, id: &str) -> String {
        format!(
            "{}/{}_{}/{}/order/{}?titleStatus=new&redirect=no#overview",
            self.config.listing_base_url.trim_end_matches('/'),
            self.config.language.to_ascii_lowercase(),
            self.config.market.to_ascii_uppercase(),
            self.config.model,
            id
        )
    }

    fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .http1_only();

        if let Some(proxy) = self.connection.next_proxy() {
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

// The request URL carries the whole query document, so it stays out of the message.
fn transport_error(e: reqwest::Error) -> AppError {
    let e = e.without_url();
    AppError::Fetch {
        status: e.status().map(|s| s.as_u16()),
        message: if e.is_timeout() {
            format!("request timed out: {}", e)
        } else {
            format!("request failed: {}", e)
        },
    }
}

#[async_trait]
impl InventorySource for HttpInventorySource {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let url = self.request_url()?;
        let client = self.build_client()?;

        let response = client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/json")
            .header(REFERER, &self.config.referer)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
            ));
        }

        let body = response.text().await.map_err(transport_error)?;
        parse_snapshot(&body, &|id: &str| self.listing_link(id))
    }
}

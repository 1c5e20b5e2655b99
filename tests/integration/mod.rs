// Shared fixtures for the end-to-end tests.

pub mod config_tests;
pub mod poll_flow_tests;
pub mod scheduler_tests;

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use inventory_watcher::config::InventoryConfig;
use inventory_watcher::core::{FileIdentifierStore, Poller};
use inventory_watcher::plugins::traits::{Notification, NotificationKind, Notifier};
use inventory_watcher::source::{DirectConnection, HttpInventorySource};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const INVENTORY_PATH: &str = "/coinorder/api/v4/inventory-results";

/// Inventory settings pointed at a mock server.
pub fn inventory_config(server: &MockServer) -> InventoryConfig {
    InventoryConfig {
        base_url: format!("{}{}", server.uri(), INVENTORY_PATH),
        listing_base_url: "https://www.tesla.com".to_string(),
        model: "my".to_string(),
        condition: "new".to_string(),
        market: "DE".to_string(),
        language: "de".to_string(),
        page_size: 24,
        request_timeout_secs: 5,
        user_agent: "InventoryWatcher-Test/1.0".to_string(),
        referer: "https://www.tesla.com/inventory/new/my".to_string(),
        proxies: vec![],
        proxy_file: None,
    }
}

pub fn inventory_body(total: u64, vins: &[&str]) -> Value {
    let results: Vec<Value> = vins
        .iter()
        .map(|vin| {
            json!({
                "VIN": vin,
                "Model": "my",
                "TrimName": "Long Range",
                "Year": 2024,
                "Price": 44990,
                "CurrencyCode": "EUR",
                "PAINT": ["WHITE"],
                "INTERIOR": ["PREMIUM_BLACK"]
            })
        })
        .collect();
    json!({ "total_matches_found": total, "results": results })
}

/// Replace whatever the mock inventory currently serves.
pub async fn serve_inventory(server: &MockServer, body: Value) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path(INVENTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn serve_status(server: &MockServer, status: u16) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path(INVENTORY_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn all(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

pub fn detail_ids(sent: &[Notification]) -> Vec<String> {
    sent.iter()
        .filter(|n| n.kind == NotificationKind::NewItem)
        .filter_map(|n| {
            n.body
                .lines()
                .find_map(|line| line.strip_prefix("ID: "))
                .map(str::to_string)
        })
        .collect()
}

/// A poller wired to the mock inventory and a file store, loading whatever is already persisted.
pub async fn http_poller(
    server: &MockServer,
    store_path: &Path,
    notifier: Arc<RecordingNotifier>,
) -> Poller {
    let source = HttpInventorySource::new(inventory_config(server), Box::new(DirectConnection));
    let store = FileIdentifierStore::load_or_empty(store_path).await;
    Poller::new(Box::new(source), Box::new(store), notifier)
}

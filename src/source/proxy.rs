use reqwest::Proxy;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::error::{AppError, Result};

/// Chooses how each upstream request connects.
pub trait ConnectionStrategy: Send + Sync {
    /// Proxy for the next request, or `None` to connect directly.
    fn next_proxy(&self) -> Option<Proxy>;

    fn describe(&self) -> String;
}

#[derive(Debug, Default)]
pub struct DirectConnection;

impl ConnectionStrategy for DirectConnection {
    fn next_proxy(&self) -> Option<Proxy> {
        None
    }

    fn describe(&self) -> String {
        "direct".to_string()
    }
}

/// Round-robin over a fixed list of `host:port` HTTP proxies.
#[derive(Debug)]
pub struct ProxyRotation {
    proxies: Vec<String>,
    current_index: AtomicUsize,
}

impl ProxyRotation {
    pub fn new(proxies: Vec<String>) -> Self {
        Self {
            proxies,
            current_index: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    fn next_entry(&self) -> Option<&str> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = self.current_index.fetch_add(1, Ordering::Relaxed) % self.proxies.len();
        Some(self.proxies[index].as_str())
    }
}

impl ConnectionStrategy for ProxyRotation {
    /// Skips entries reqwest rejects, so one bad line never forces a direct request.
    fn next_proxy(&self) -> Option<Proxy> {
        for _ in 0..self.len() {
            let entry = self.next_entry()?;
            match build_proxy(entry) {
                Ok(proxy) => {
                    tracing::debug!("Using proxy {}", entry);
                    return Some(proxy);
                }
                Err(e) => tracing::warn!("Skipping invalid proxy {}: {}", entry, e),
            }
        }
        None
    }

    fn describe(&self) -> String {
        format!("{} rotating proxies", self.len())
    }
}

fn build_proxy(entry: &str) -> reqwest::Result<Proxy> {
    Proxy::all(format!("http://{}", entry))
}

/// Keep non-blank `host:port` entries.
pub fn parse_proxy_list<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains(':'))
        .map(str::to_string)
        .collect()
}

pub async fn load_proxy_file(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read proxy list {}: {}", path.display(), e),
        ))
    })?;
    let proxies = parse_proxy_list(contents.lines());
    tracing::info!("Loaded {} proxies from {}", proxies.len(), path.display());
    Ok(proxies)
}

/// Rotation over the entries reqwest accepts, or a direct connection when none remain.
pub fn strategy_for(proxies: Vec<String>) -> Box<dyn ConnectionStrategy> {
    let usable: Vec<String> = proxies
        .into_iter()
        .filter(|entry| match build_proxy(entry) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Dropping invalid proxy {}: {}", entry, e);
                false
            }
        })
        .collect();

    let rotation = ProxyRotation::new(usable);
    if rotation.is_empty() {
        Box::new(DirectConnection)
    } else {
        tracing::info!("Rotating over {} proxies", rotation.len());
        Box::new(rotation)
    }
}

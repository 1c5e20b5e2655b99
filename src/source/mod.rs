pub mod http;
pub mod parser;
pub mod proxy;

use async_trait::async_trait;

use crate::models::Snapshot;
use crate::utils::error::Result;

pub use http::HttpInventorySource;
pub use proxy::{ConnectionStrategy, DirectConnection, ProxyRotation};

/// Upstream inventory search.
///
/// Fails with `AppError::Fetch` on transport errors or non-success statuses and
/// with `AppError::Parse` when the body is not the expected JSON shape.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot>;
}

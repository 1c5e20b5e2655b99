use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-lifetime state carried from one cycle to the next.
///
/// Not persisted: after a restart `last_total_count` is 0, so the first
/// successful poll is classified as initial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    pub last_total_count: u64,
    pub in_error_state: bool,
    pub last_error_notified_at: Option<DateTime<Utc>>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }
}

use chrono::{DateTime, Duration, Utc};

use crate::models::PollState;

pub const DEFAULT_REPEAT_INTERVAL_MINS: i64 = 30;

/// Alert to emit after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAlert {
    /// Healthy -> Failing.
    First,
    /// Still failing and the repeat interval has passed since the last alert.
    StillFailing,
}

/// Throttles failure alerts while the upstream keeps failing.
///
/// Holds no timers; every decision is made against the timestamp the caller passes in.
#[derive(Debug, Clone)]
pub struct ErrorStateTracker {
    repeat_interval: Duration,
}

impl Default for ErrorStateTracker {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_REPEAT_INTERVAL_MINS))
    }
}

impl ErrorStateTracker {
    pub fn new(repeat_interval: Duration) -> Self {
        Self { repeat_interval }
    }

    pub fn repeat_interval(&self) -> Duration {
        self.repeat_interval
    }

    pub fn record_failure(&self, state: &mut PollState, now: DateTime<Utc>) -> Option<FailureAlert> {
        if !state.in_error_state {
            state.in_error_state = true;
            state.last_error_notified_at = Some(now);
            return Some(FailureAlert::First);
        }

        let due = match state.last_error_notified_at {
            Some(last) => now.signed_duration_since(last) > self.repeat_interval,
            None => true,
        };

        if due {
            state.last_error_notified_at = Some(now);
            Some(FailureAlert::StillFailing)
        } else {
            None
        }
    }

    /// Clears the failing state. Returns `true` if the state was failing.
    pub fn record_success(&self, state: &mut PollState) -> bool {
        let was_failing = state.in_error_state;
        state.in_error_state = false;
        state.last_error_notified_at = None;
        was_failing
    }
}

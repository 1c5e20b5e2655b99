use chrono::{DateTime, Local, Utc};
use std::sync::Arc;

use crate::core::active_hours::ActiveHours;
use crate::core::detector::{ChangeDetector, ChangeKind};
use crate::core::error_state::{ErrorStateTracker, FailureAlert};
use crate::core::identifier_store::IdentifierStore;
use crate::models::PollState;
use crate::plugins::templates;
use crate::plugins::traits::Notifier;
use crate::source::InventorySource;
use crate::utils::error::Result;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Outside active hours. Nothing was fetched or mutated.
    Skipped,
    Unchanged { total: u64 },
    Changed { change: ChangeKind, new_items: usize },
    Failed { alerted: bool },
}

/// One fetch -> detect -> notify cycle.
///
/// The poller owns the identifier store. Poll state is passed in and handed
/// back so the caller decides where it lives between cycles.
pub struct Poller {
    source: Box<dyn InventorySource>,
    store: Box<dyn IdentifierStore>,
    notifier: Arc<dyn Notifier>,
    detector: ChangeDetector,
    tracker: ErrorStateTracker,
    active_hours: Option<ActiveHours>,
    notify_on_recovery: bool,
}

impl Poller {
    pub fn new(
        source: Box<dyn InventorySource>,
        store: Box<dyn IdentifierStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            detector: ChangeDetector::new(),
            tracker: ErrorStateTracker::default(),
            active_hours: None,
            notify_on_recovery: false,
        }
    }

    pub fn with_active_hours(mut self, active_hours: Option<ActiveHours>) -> Self {
        self.active_hours = active_hours;
        self
    }

    pub fn with_tracker(mut self, tracker: ErrorStateTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_recovery_notification(mut self, enabled: bool) -> Self {
        self.notify_on_recovery = enabled;
        self
    }

    pub fn store(&self) -> &dyn IdentifierStore {
        self.store.as_ref()
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.store.persist().await
    }

    pub async fn run_cycle(
        &mut self,
        mut state: PollState,
        now: DateTime<Local>,
    ) -> (PollState, CycleOutcome) {
        if let Some(window) = &self.active_hours {
            if !window.is_active_at(now) {
                tracing::debug!("Outside active hours ({}), skipping cycle", window);
                metrics::counter!("watcher_cycles_skipped_total").increment(1);
                return (state, CycleOutcome::Skipped);
            }
        }

        metrics::counter!("watcher_cycles_total").increment(1);

        let snapshot = match self.source.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                metrics::counter!("watcher_cycle_failures_total").increment(1);
                if e.is_upstream() {
                    tracing::warn!("Inventory check failed: {}", e);
                } else {
                    tracing::error!("Inventory check failed: {}", e);
                }

                let alert = self.tracker.record_failure(&mut state, now.with_timezone(&Utc));
                match alert {
                    Some(FailureAlert::First) => {
                        self.notifier
                            .dispatch(templates::first_failure(&e.to_string()))
                            .await;
                    }
                    Some(FailureAlert::StillFailing) => {
                        self.notifier
                            .dispatch(templates::still_failing(
                                &e.to_string(),
                                self.tracker.repeat_interval(),
                            ))
                            .await;
                    }
                    None => tracing::debug!("Failure alert suppressed until the repeat interval passes"),
                }
                return (state, CycleOutcome::Failed { alerted: alert.is_some() });
            }
        };

        if self.tracker.record_success(&mut state) {
            tracing::info!("Inventory check recovered");
            if self.notify_on_recovery {
                self.notifier.dispatch(templates::recovered()).await;
            }
        }

        let detection = self
            .detector
            .detect(state.last_total_count, &snapshot, self.store.as_ref());
        state.last_total_count = snapshot.total_count;

        let summary = match detection.change {
            ChangeKind::Unchanged { total } => {
                tracing::debug!("No change in inventory (total {})", total);
                return (state, CycleOutcome::Unchanged { total });
            }
            ChangeKind::Initial { total } => templates::initial_summary(total),
            ChangeKind::Delta { total, delta, .. } if delta > 0 => {
                templates::arrivals_summary(delta.unsigned_abs(), total)
            }
            ChangeKind::Delta { total, delta, .. } => {
                templates::removals_summary(delta.unsigned_abs(), total)
            }
        };

        tracing::info!(
            "Inventory changed: {:?}, {} unseen item(s)",
            detection.change,
            detection.new_items.len()
        );
        self.notifier.dispatch(summary).await;

        // Record each id only after its detail message went out.
        let mut recorded = 0;
        for item in &detection.new_items {
            self.notifier.dispatch(templates::item_details(item)).await;
            if self.store.add(&item.id) {
                recorded += 1;
            }
        }
        metrics::counter!("watcher_new_items_total").increment(recorded as u64);

        if recorded > 0 {
            if let Err(e) = self.store.persist().await {
                tracing::error!("Failed to persist identifiers, keeping them in memory: {}", e);
            }
        }

        (
            state,
            CycleOutcome::Changed {
                change: detection.change,
                new_items: recorded,
            },
        )
    }
}

//! Snapshot classification and new-item detection.
//!
//! The detector is pure: it reads the identifier store but never writes to it.
//! The poll loop records identifiers only after the matching detail
//! notification has been dispatched.

use std::collections::HashSet;

use crate::core::identifier_store::IdentifierStore;
use crate::models::{Item, Snapshot};

/// How the total count moved since the previous successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unchanged { total: u64 },
    /// First non-empty result since start (or since a restart).
    Initial { total: u64 },
    /// `delta` is signed; negative means listings disappeared.
    Delta { previous: u64, total: u64, delta: i64 },
}

impl ChangeKind {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, ChangeKind::Unchanged { .. })
    }

    /// Only a positive delta may be framed as new arrivals.
    pub fn reports_arrivals(&self) -> bool {
        match self {
            ChangeKind::Initial { .. } => true,
            ChangeKind::Delta { delta, .. } => *delta > 0,
            ChangeKind::Unchanged { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub change: ChangeKind,
    /// Unseen items in snapshot order, each id at most once.
    pub new_items: Vec<Item>,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(last_total: u64, total: u64) -> ChangeKind {
        if total == last_total {
            ChangeKind::Unchanged { total }
        } else if last_total == 0 {
            // total > 0 here, since total != last_total
            ChangeKind::Initial { total }
        } else {
            ChangeKind::Delta {
                previous: last_total,
                total,
                delta: total as i64 - last_total as i64,
            }
        }
    }

    pub fn detect(
        &self,
        last_total: u64,
        snapshot: &Snapshot,
        known: &dyn IdentifierStore,
    ) -> Detection {
        let change = Self::classify(last_total, snapshot.total_count);
        if change.is_unchanged() {
            return Detection {
                change,
                new_items: Vec::new(),
            };
        }

        if snapshot.items.len() as u64 > snapshot.total_count {
            tracing::debug!(
                "Snapshot lists {} items but reports a total of {}",
                snapshot.items.len(),
                snapshot.total_count
            );
        }

        let mut seen_in_snapshot = HashSet::new();
        let new_items = snapshot
            .items
            .iter()
            .filter(|item| {
                if item.id.trim().is_empty() {
                    tracing::debug!("Skipping item without identifier");
                    return false;
                }
                !known.contains(&item.id) && seen_in_snapshot.insert(item.id.as_str())
            })
            .cloned()
            .collect();

        Detection { change, new_items }
    }
}

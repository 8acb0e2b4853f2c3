//! Sync run counters.

use serde::{Deserialize, Serialize};

use crate::item::{ItemOutcome, SyncAction};

/// Counters built incrementally during one sync job. Immutable once the
/// job completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Items considered.
    pub total: u32,
    /// Local records created.
    pub created: u32,
    /// Local records updated.
    pub updated: u32,
    /// Items intentionally left untouched.
    pub skipped: u32,
    /// Local records deleted. Reserved: no current path produces this.
    pub deleted: u32,
    /// Items that failed.
    pub errors: u32,
    /// Conflicts flagged for review.
    pub conflicts: u32,
    /// Items whose stock actually changed.
    pub inventory_updates: u32,
    /// Items whose price actually changed.
    pub price_updates: u32,
}

impl SyncStats {
    /// Stats for a benign skip (duplicate webhook or unparseable
    /// event): `skipped = 1`, every other counter zero. No item was
    /// actually considered, so `total` stays zero too.
    #[must_use]
    pub fn one_skipped() -> Self {
        Self {
            skipped: 1,
            ..Self::default()
        }
    }

    /// Record the outcome of one item sync.
    pub fn record_outcome(&mut self, outcome: &ItemOutcome) {
        self.total += 1;
        match outcome.action {
            SyncAction::Created => self.created += 1,
            SyncAction::Updated => self.updated += 1,
            SyncAction::Skipped => self.skipped += 1,
            SyncAction::Deleted => self.deleted += 1,
        }
        if outcome.conflict.is_some() {
            self.conflicts += 1;
        }
        if outcome.inventory_updated {
            self.inventory_updates += 1;
        }
        if outcome.price_updated {
            self.price_updates += 1;
        }
    }

    /// Record one failed item.
    pub fn record_failure(&mut self) {
        self.total += 1;
        self.errors += 1;
    }

    /// Record one applied inventory overwrite.
    pub fn record_inventory_update(&mut self) {
        self.total += 1;
        self.updated += 1;
        self.inventory_updates += 1;
    }

    /// Record one inventory row with no matching local product.
    pub fn record_inventory_miss(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    /// Whether every item applied cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

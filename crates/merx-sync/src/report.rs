//! Sync job results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::ProductConflict;
use crate::error::SyncError;
use crate::stats::SyncStats;

/// Terminal status of a sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Every item applied cleanly (or the job was a benign no-op).
    Completed,
    /// The job finished but some items failed.
    Partial,
}

impl SyncStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Completed => "completed",
            SyncStatus::Partial => "partial",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed item. Collected during the batch; never aborts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// External id of the failed item, when known.
    pub external_id: String,
    /// SKU of the failed item, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Human-readable failure description.
    pub message: String,
    /// Classification code (see [`SyncError::error_code`]).
    pub code: String,
    /// Whether a future pass should re-attempt this item.
    pub retryable: bool,
}

impl ItemError {
    /// Build the item error for a failed sync of `external_id`.
    #[must_use]
    pub fn from_error(external_id: &str, sku: Option<&str>, error: &SyncError) -> Self {
        Self {
            external_id: external_id.to_string(),
            sku: sku.map(ToString::to_string),
            message: error.to_string(),
            code: error.error_code().to_string(),
            retryable: error.is_retryable(),
        }
    }

    /// The advisory error reported when a bulk job loses the sync lock.
    #[must_use]
    pub fn lock_contention(key: &str) -> Self {
        Self {
            external_id: String::new(),
            sku: None,
            message: format!("sync already running for {key}"),
            code: "SYNC_LOCKED".to_string(),
            retryable: true,
        }
    }
}

/// Result of one sync job, returned to the queue transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Whether every item applied cleanly.
    pub success: bool,
    /// Correlation id of the job.
    pub sync_id: Uuid,
    /// Terminal status.
    pub status: SyncStatus,
    /// Counters.
    pub stats: SyncStats,
    /// Per-item failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
    /// Conflicts flagged for review.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ProductConflict>,
    /// Wall-clock duration of the job.
    pub duration_ms: u64,
    /// When the job finished.
    pub last_sync_at: DateTime<Utc>,
    /// Advisory next sync time for bulk modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_sync_recommended: Option<DateTime<Utc>>,
}

impl SyncReport {
    /// Build a report from accumulated counters. Success and status
    /// derive from the error count.
    #[must_use]
    pub fn from_stats(
        sync_id: Uuid,
        stats: SyncStats,
        errors: Vec<ItemError>,
        conflicts: Vec<ProductConflict>,
        duration_ms: u64,
    ) -> Self {
        let status = if stats.is_clean() {
            SyncStatus::Completed
        } else {
            SyncStatus::Partial
        };
        Self {
            success: stats.is_clean(),
            sync_id,
            status,
            stats,
            errors,
            conflicts,
            duration_ms,
            last_sync_at: Utc::now(),
            next_sync_recommended: None,
        }
    }

    /// Report for a webhook redelivery that was already processed:
    /// benign skip, repository untouched.
    #[must_use]
    pub fn duplicate(sync_id: Uuid, duration_ms: u64) -> Self {
        Self {
            success: true,
            sync_id,
            status: SyncStatus::Completed,
            stats: SyncStats::one_skipped(),
            errors: Vec::new(),
            conflicts: Vec::new(),
            duration_ms,
            last_sync_at: Utc::now(),
            next_sync_recommended: None,
        }
    }

    /// Zero-work report for a bulk job that lost the sync lock. The
    /// single advisory error tells the caller to rely on the next
    /// scheduled tick rather than retry immediately.
    #[must_use]
    pub fn locked(sync_id: Uuid, key: &str, duration_ms: u64) -> Self {
        Self {
            success: false,
            sync_id,
            status: SyncStatus::Completed,
            stats: SyncStats::default(),
            errors: vec![ItemError::lock_contention(key)],
            conflicts: Vec::new(),
            duration_ms,
            last_sync_at: Utc::now(),
            next_sync_recommended: None,
        }
    }

    /// Attach the advisory next sync time.
    #[must_use]
    pub fn with_next_sync(mut self, at: DateTime<Utc>) -> Self {
        self.next_sync_recommended = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_stats_complete() {
        let mut stats = SyncStats::default();
        stats.record_inventory_update();

        let report = SyncReport::from_stats(Uuid::new_v4(), stats, Vec::new(), Vec::new(), 12);
        assert!(report.success);
        assert_eq!(report.status, SyncStatus::Completed);
    }

    #[test]
    fn test_errors_mean_partial() {
        let mut stats = SyncStats::default();
        stats.record_failure();
        let errors = vec![ItemError {
            external_id: "1".into(),
            sku: None,
            message: "boom".into(),
            code: "REPOSITORY_ERROR".into(),
            retryable: true,
        }];

        let report = SyncReport::from_stats(Uuid::new_v4(), stats, errors, Vec::new(), 5);
        assert!(!report.success);
        assert_eq!(report.status, SyncStatus::Partial);
    }

    #[test]
    fn test_duplicate_report() {
        let report = SyncReport::duplicate(Uuid::new_v4(), 1);
        assert!(report.success);
        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.created, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_locked_report() {
        let report = SyncReport::locked(Uuid::new_v4(), "sync:t:shopify", 0);
        assert!(!report.success);
        assert_eq!(report.stats.total, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, "SYNC_LOCKED");
        assert!(report.errors[0].retryable);
    }

    #[test]
    fn test_item_error_from_sync_error() {
        let err = SyncError::repository("row lock timeout");
        let item = ItemError::from_error("555", Some("MUG-RED"), &err);
        assert_eq!(item.code, "REPOSITORY_ERROR");
        assert!(item.retryable);
        assert!(item.message.contains("row lock timeout"));
    }
}

//! Bulk sync mutual exclusion.
//!
//! At most one bulk job (delta, full, inventory) runs per
//! `(tenant, source)` at a time. Acquisition is non-blocking: a second
//! concurrent attempt is rejected immediately rather than queued. The
//! TTL covers worst-case processing time so a crashed holder cannot
//! block forever, and release is keyed by the lock id returned at
//! acquisition so an expired-and-reacquired lock is never released by
//! the original holder.

use std::time::Duration;

use async_trait::async_trait;
use merx_connector::ProductSource;
use uuid::Uuid;

use crate::error::SyncResult;

/// Outcome of a lock acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockAttempt {
    /// Whether the lock was acquired.
    pub acquired: bool,
    /// Token identifying this lock instance; required for release.
    pub lock_id: Option<Uuid>,
}

impl LockAttempt {
    /// A successful acquisition.
    #[must_use]
    pub fn acquired(lock_id: Uuid) -> Self {
        Self {
            acquired: true,
            lock_id: Some(lock_id),
        }
    }

    /// A rejected acquisition.
    #[must_use]
    pub fn contended() -> Self {
        Self {
            acquired: false,
            lock_id: None,
        }
    }
}

/// Shared distributed lock service with TTL semantics.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Attempt to acquire `key`. `wait` is how long to block for the
    /// lock; bulk sync always passes zero.
    async fn acquire(&self, key: &str, ttl: Duration, wait: Duration) -> SyncResult<LockAttempt>;

    /// Release the lock instance identified by `lock_id`. A mismatched
    /// id is a no-op.
    async fn release(&self, key: &str, lock_id: Uuid) -> SyncResult<()>;
}

/// Lock key for a tenant's bulk sync against one source.
#[must_use]
pub fn sync_lock_key(tenant_id: Uuid, source: ProductSource) -> String {
    format!("sync:{tenant_id}:{source}")
}

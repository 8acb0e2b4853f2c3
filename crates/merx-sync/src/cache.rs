//! Product cache invalidation port.
//!
//! Invalidation is fire-and-forget relative to job semantics: even a
//! partial sync changes visible state, so the orchestrator invalidates
//! regardless of the per-item error count and only logs invalidation
//! failures.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SyncResult;

/// Cache invalidation transport.
#[async_trait]
pub trait ProductCache: Send + Sync {
    /// Invalidate every cache entry under `prefix`.
    async fn invalidate_prefix(&self, prefix: &str) -> SyncResult<()>;
}

/// Prefix covering a tenant's product listings and detail pages.
#[must_use]
pub fn product_prefix(tenant_id: Uuid) -> String {
    format!("products:{tenant_id}")
}

/// Prefix covering only a tenant's inventory-derived keys.
#[must_use]
pub fn inventory_prefix(tenant_id: Uuid) -> String {
    format!("inventory:{tenant_id}")
}

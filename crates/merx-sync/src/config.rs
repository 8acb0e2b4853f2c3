//! Per-tenant sync configuration and delta checkpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use merx_connector::ProductSource;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncResult;

/// Sync configuration for one `(tenant, source)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSourceConfig {
    /// Tenant the configuration belongs to.
    pub tenant_id: Uuid,
    /// Platform to synchronize with.
    pub source: ProductSource,
    /// Whether scheduled syncs are enabled.
    pub enabled: bool,
}

/// Store for sync configuration and the delta checkpoint.
///
/// The checkpoint marks the lower bound of the next delta window. It
/// only ever moves forward: the orchestrator advances it after every
/// bulk run, including partial ones, so a delta never replays the same
/// window forever.
#[async_trait]
pub trait SyncConfigStore: Send + Sync {
    /// Last successful sync checkpoint for `(tenant, source)`.
    async fn last_sync_at(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
    ) -> SyncResult<Option<DateTime<Utc>>>;

    /// Advance the checkpoint.
    async fn set_last_sync_at(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
        at: DateTime<Utc>,
    ) -> SyncResult<()>;

    /// All configurations with scheduled sync enabled.
    async fn list_enabled(&self) -> SyncResult<Vec<SyncSourceConfig>>;
}

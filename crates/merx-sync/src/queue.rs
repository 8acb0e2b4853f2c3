//! Job queue port.
//!
//! The scheduler enqueues jobs through this trait; the queue transport
//! (delivery, retry, backoff) is out of scope for the engine.

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::job::SyncJob;

/// Outbound queue for sync jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for a worker to consume.
    async fn enqueue(&self, job: SyncJob) -> SyncResult<()>;
}

//! Sync orchestration.
//!
//! Top-level entry point per job mode. Webhook jobs run under the
//! idempotency guard; bulk jobs (delta, full, inventory) run under the
//! per-`(tenant, source)` sync lock. The orchestrator owns failure
//! isolation: one bad item never aborts a batch, and guard cleanup
//! (idempotency release, lock release) happens before any error
//! propagates to the queue transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use merx_connector::{normalize, ProductFilter, SourceClient};
use tracing::{debug, info, instrument, warn};

use crate::cache::{inventory_prefix, product_prefix, ProductCache};
use crate::catalog::CatalogRepository;
use crate::config::SyncConfigStore;
use crate::error::{SyncError, SyncResult};
use crate::idempotency::{self, IdempotencyStore};
use crate::item::ItemSyncer;
use crate::job::{SyncJob, SyncMode};
use crate::lock::{sync_lock_key, LockService};
use crate::report::{ItemError, SyncReport};
use crate::stats::SyncStats;

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Currency assumed when a payload carries none.
    pub base_currency: String,
    /// TTL for the bulk sync lock. Must cover worst-case batch time so a
    /// crashed holder cannot block the tenant forever.
    pub lock_ttl: Duration,
    /// TTL for idempotency records.
    pub idempotency_ttl: Duration,
    /// Interval recommended to callers between bulk syncs.
    pub next_sync_interval: chrono::Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            base_currency: "USD".to_string(),
            lock_ttl: Duration::from_secs(30 * 60),
            idempotency_ttl: Duration::from_secs(24 * 60 * 60),
            next_sync_interval: chrono::Duration::hours(6),
        }
    }
}

/// Drives sync jobs end to end: guard selection, fetch, per-item loop,
/// stats aggregation, checkpoint update, cache invalidation.
pub struct SyncOrchestrator {
    repository: Arc<dyn CatalogRepository>,
    sources: Arc<dyn SourceClient>,
    idempotency: Arc<dyn IdempotencyStore>,
    locks: Arc<dyn LockService>,
    cache: Arc<dyn ProductCache>,
    configs: Arc<dyn SyncConfigStore>,
    syncer: ItemSyncer,
    options: SyncOptions,
}

impl SyncOrchestrator {
    /// Create an orchestrator over the given ports.
    #[must_use]
    pub fn new(
        repository: Arc<dyn CatalogRepository>,
        sources: Arc<dyn SourceClient>,
        idempotency: Arc<dyn IdempotencyStore>,
        locks: Arc<dyn LockService>,
        cache: Arc<dyn ProductCache>,
        configs: Arc<dyn SyncConfigStore>,
    ) -> Self {
        let syncer = ItemSyncer::new(Arc::clone(&repository));
        Self {
            repository,
            sources,
            idempotency,
            locks,
            cache,
            configs,
            syncer,
            options: SyncOptions::default(),
        }
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one sync job to completion.
    ///
    /// Benign short-circuits (duplicate webhook, lock contention,
    /// unparseable event) return `Ok` reports; only malformed jobs and
    /// failures that escape the guards return `Err`, and those are the
    /// cases the queue transport should retry.
    #[instrument(
        skip(self, job),
        fields(
            sync_id = %job.sync_id,
            tenant_id = %job.tenant_id,
            source = %job.source,
            mode = %job.mode,
        )
    )]
    pub async fn run(&self, job: &SyncJob) -> SyncResult<SyncReport> {
        job.validate()?;
        let started = Instant::now();

        let report = match job.mode {
            SyncMode::Webhook => self.run_webhook(job, started).await?,
            SyncMode::Delta => self.run_bulk(job, false, started).await?,
            SyncMode::Full => self.run_bulk(job, true, started).await?,
            SyncMode::Inventory => self.run_inventory(job, started).await?,
        };

        info!(
            success = report.success,
            status = %report.status,
            total = report.stats.total,
            errors = report.stats.errors,
            duration_ms = report.duration_ms,
            "sync job finished"
        );
        Ok(report)
    }

    // -- webhook ----------------------------------------------------------

    async fn run_webhook(&self, job: &SyncJob, started: Instant) -> SyncResult<SyncReport> {
        let Some(event) = &job.webhook else {
            return Err(SyncError::validation("webhook mode requires webhook data"));
        };

        let key = idempotency::derive_key(job.source, event);
        let acquisition = self
            .idempotency
            .try_acquire(&key, self.options.idempotency_ttl)
            .await?;
        if !acquisition.acquired {
            debug!(key = %key, "duplicate webhook event, skipping");
            return Ok(SyncReport::duplicate(job.sync_id, elapsed_ms(started)));
        }

        let result: SyncResult<SyncReport> = async {
            let report = self.apply_webhook(job, started).await?;
            let response = serde_json::to_value(&report)?;
            self.idempotency.store_response(&key, response, 200).await?;
            Ok(report)
        }
        .await;

        match result {
            Ok(report) => Ok(report),
            Err(error) => {
                // Release before propagating so a legitimate retry of
                // this event is not permanently blocked.
                if let Err(release_error) = self.idempotency.release(&key).await {
                    warn!(key = %key, error = %release_error, "failed to release idempotency key");
                }
                Err(error)
            }
        }
    }

    async fn apply_webhook(&self, job: &SyncJob, started: Instant) -> SyncResult<SyncReport> {
        let Some(event) = &job.webhook else {
            return Err(SyncError::validation("webhook mode requires webhook data"));
        };

        let Some(product) = normalize(job.source, &self.options.base_currency, &event.payload)
        else {
            // A permanently malformed event completes as a no-op so the
            // transport does not redeliver it forever.
            info!("webhook payload is not a product event, completing as no-op");
            return Ok(SyncReport::from_stats(
                job.sync_id,
                SyncStats::one_skipped(),
                Vec::new(),
                Vec::new(),
                elapsed_ms(started),
            ));
        };

        let outcome = self
            .syncer
            .sync_one(job.tenant_id, &product, job.policy)
            .await?;

        let conflicts = outcome.conflict.clone().into_iter().collect();
        let mut stats = SyncStats::default();
        stats.record_outcome(&outcome);

        Ok(SyncReport::from_stats(
            job.sync_id,
            stats,
            Vec::new(),
            conflicts,
            elapsed_ms(started),
        ))
    }

    // -- delta / full ------------------------------------------------------

    async fn run_bulk(&self, job: &SyncJob, full: bool, started: Instant) -> SyncResult<SyncReport> {
        let key = sync_lock_key(job.tenant_id, job.source);
        let attempt = self
            .locks
            .acquire(&key, self.options.lock_ttl, Duration::ZERO)
            .await?;
        if !attempt.acquired {
            warn!(key = %key, "bulk sync already running for tenant and source");
            return Ok(SyncReport::locked(job.sync_id, &key, elapsed_ms(started)));
        }
        let lock_id = attempt
            .lock_id
            .ok_or_else(|| SyncError::internal("lock acquired without a lock id"))?;

        let result = self.run_bulk_locked(job, full, started).await;

        // Release is keyed by this acquisition's lock id: if the TTL
        // expired and another job re-acquired, this release is a no-op.
        if let Err(error) = self.locks.release(&key, lock_id).await {
            warn!(key = %key, error = %error, "failed to release sync lock");
        }

        result
    }

    async fn run_bulk_locked(
        &self,
        job: &SyncJob,
        full: bool,
        started: Instant,
    ) -> SyncResult<SyncReport> {
        let updated_after = if full {
            None
        } else {
            match job.filter.and_then(|f| f.updated_after) {
                Some(explicit) => Some(explicit),
                None => self.configs.last_sync_at(job.tenant_id, job.source).await?,
            }
        };
        let filter = ProductFilter { updated_after };

        let products = self
            .sources
            .fetch_products(job.tenant_id, job.source, &filter)
            .await?;
        let total = products.len();
        info!(total, ?updated_after, "fetched candidate products");

        let mut stats = SyncStats::default();
        let mut errors = Vec::new();
        let mut conflicts = Vec::new();

        for (index, product) in products.iter().enumerate() {
            match self
                .syncer
                .sync_one(job.tenant_id, product, job.policy)
                .await
            {
                Ok(outcome) => {
                    if let Some(conflict) = &outcome.conflict {
                        conflicts.push(conflict.clone());
                    }
                    stats.record_outcome(&outcome);
                }
                Err(error) => {
                    warn!(
                        external_id = %product.external_id,
                        error = %error,
                        "item sync failed, continuing batch"
                    );
                    errors.push(ItemError::from_error(
                        &product.external_id,
                        product.sku.as_deref(),
                        &error,
                    ));
                    stats.record_failure();
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let progress = (index + 1) as f64 / total as f64;
            debug!(progress, "batch progress");
        }

        // The checkpoint advances even when items errored, so a delta
        // never replays the same window forever.
        let finished_at = Utc::now();
        self.configs
            .set_last_sync_at(job.tenant_id, job.source, finished_at)
            .await?;

        self.invalidate(product_prefix(job.tenant_id)).await;

        Ok(SyncReport::from_stats(
            job.sync_id,
            stats,
            errors,
            conflicts,
            elapsed_ms(started),
        )
        .with_next_sync(finished_at + self.options.next_sync_interval))
    }

    // -- inventory ---------------------------------------------------------

    async fn run_inventory(&self, job: &SyncJob, started: Instant) -> SyncResult<SyncReport> {
        let key = sync_lock_key(job.tenant_id, job.source);
        let attempt = self
            .locks
            .acquire(&key, self.options.lock_ttl, Duration::ZERO)
            .await?;
        if !attempt.acquired {
            warn!(key = %key, "bulk sync already running for tenant and source");
            return Ok(SyncReport::locked(job.sync_id, &key, elapsed_ms(started)));
        }
        let lock_id = attempt
            .lock_id
            .ok_or_else(|| SyncError::internal("lock acquired without a lock id"))?;

        let result = self.run_inventory_locked(job, started).await;

        if let Err(error) = self.locks.release(&key, lock_id).await {
            warn!(key = %key, error = %error, "failed to release sync lock");
        }

        result
    }

    async fn run_inventory_locked(
        &self,
        job: &SyncJob,
        started: Instant,
    ) -> SyncResult<SyncReport> {
        let levels = self
            .sources
            .fetch_inventory(job.tenant_id, job.source)
            .await?;
        info!(total = levels.len(), "fetched inventory levels");

        let mut stats = SyncStats::default();
        let mut errors = Vec::new();

        for level in &levels {
            let applied = self
                .repository
                .update_inventory(
                    job.tenant_id,
                    job.source,
                    &level.external_id,
                    level.sku.as_deref(),
                    level.quantity,
                )
                .await;

            match applied {
                Ok(true) => stats.record_inventory_update(),
                Ok(false) => {
                    debug!(external_id = %level.external_id, "no local product for inventory row");
                    stats.record_inventory_miss();
                }
                Err(error) => {
                    warn!(
                        external_id = %level.external_id,
                        error = %error,
                        "inventory update failed, continuing"
                    );
                    errors.push(ItemError::from_error(
                        &level.external_id,
                        level.sku.as_deref(),
                        &error,
                    ));
                    stats.record_failure();
                }
            }
        }

        self.invalidate(inventory_prefix(job.tenant_id)).await;

        Ok(SyncReport::from_stats(
            job.sync_id,
            stats,
            errors,
            Vec::new(),
            elapsed_ms(started),
        ))
    }

    /// Fire-and-forget cache invalidation: even a partial sync changed
    /// visible state, and a failed invalidation must not fail the job.
    async fn invalidate(&self, prefix: String) {
        if let Err(error) = self.cache.invalidate_prefix(&prefix).await {
            warn!(prefix = %prefix, error = %error, "cache invalidation failed");
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

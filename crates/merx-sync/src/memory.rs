//! In-memory port implementations.
//!
//! Process-local stand-ins for the shared external stores, suitable for
//! local testing and simulation only: the engine assumes multiple worker
//! processes in production, where these concerns live in shared
//! TTL-based services. The engine itself only ever talks to the traits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use merx_connector::ProductSource;
use uuid::Uuid;

use crate::cache::ProductCache;
use crate::catalog::{CatalogRepository, NewProduct, ProductPatch, ProductRecord};
use crate::config::{SyncConfigStore, SyncSourceConfig};
use crate::error::{SyncError, SyncResult};
use crate::idempotency::{AcquireOutcome, IdempotencyRecord, IdempotencyStore};
use crate::job::SyncJob;
use crate::lock::{LockAttempt, LockService};
use crate::queue::JobQueue;

fn guarded<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_chrono(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365))
}

// ---------------------------------------------------------------------------
// Idempotency store
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct IdempotencySlot {
    record: Option<IdempotencyRecord>,
    expires_at: DateTime<Utc>,
}

/// In-memory [`IdempotencyStore`].
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    slots: Mutex<HashMap<String, IdempotencySlot>>,
}

impl InMemoryIdempotencyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys (test helper).
    #[must_use]
    pub fn len(&self) -> usize {
        guarded(&self.slots).len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> SyncResult<AcquireOutcome> {
        let mut slots = guarded(&self.slots);
        let now = Utc::now();
        slots.retain(|_, slot| slot.expires_at > now);

        if let Some(slot) = slots.get(key) {
            return Ok(AcquireOutcome {
                acquired: false,
                existing: slot.record.clone(),
            });
        }

        slots.insert(
            key.to_string(),
            IdempotencySlot {
                record: None,
                expires_at: now + to_chrono(ttl),
            },
        );
        Ok(AcquireOutcome {
            acquired: true,
            existing: None,
        })
    }

    async fn store_response(
        &self,
        key: &str,
        response: serde_json::Value,
        status_code: u16,
    ) -> SyncResult<()> {
        let mut slots = guarded(&self.slots);
        let slot = slots
            .get_mut(key)
            .ok_or_else(|| SyncError::store(format!("idempotency key not held: {key}")))?;
        slot.record = Some(IdempotencyRecord {
            key: key.to_string(),
            response,
            status_code,
            stored_at: Utc::now(),
        });
        Ok(())
    }

    async fn release(&self, key: &str) -> SyncResult<()> {
        guarded(&self.slots).remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lock service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct LockSlot {
    lock_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// In-memory [`LockService`] honoring TTL expiry and lock-id-checked
/// release.
#[derive(Debug, Default)]
pub struct InMemoryLockService {
    locks: Mutex<HashMap<String, LockSlot>>,
}

impl InMemoryLockService {
    /// Create an empty lock service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently held (test helper).
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        guarded(&self.locks)
            .get(key)
            .is_some_and(|slot| slot.expires_at > Utc::now())
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, key: &str, ttl: Duration, _wait: Duration) -> SyncResult<LockAttempt> {
        let mut locks = guarded(&self.locks);
        let now = Utc::now();

        if locks.get(key).is_some_and(|slot| slot.expires_at > now) {
            return Ok(LockAttempt::contended());
        }

        let lock_id = Uuid::new_v4();
        locks.insert(
            key.to_string(),
            LockSlot {
                lock_id,
                expires_at: now + to_chrono(ttl),
            },
        );
        Ok(LockAttempt::acquired(lock_id))
    }

    async fn release(&self, key: &str, lock_id: Uuid) -> SyncResult<()> {
        let mut locks = guarded(&self.locks);
        // Only the holder of this lock instance may release it.
        if locks.get(key).is_some_and(|slot| slot.lock_id == lock_id) {
            locks.remove(key);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sync config store
// ---------------------------------------------------------------------------

/// In-memory [`SyncConfigStore`].
#[derive(Debug, Default)]
pub struct InMemorySyncConfigStore {
    checkpoints: Mutex<HashMap<(Uuid, ProductSource), DateTime<Utc>>>,
    configs: Mutex<Vec<SyncSourceConfig>>,
}

impl InMemorySyncConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant configuration.
    pub fn add_config(&self, config: SyncSourceConfig) {
        guarded(&self.configs).push(config);
    }
}

#[async_trait]
impl SyncConfigStore for InMemorySyncConfigStore {
    async fn last_sync_at(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
    ) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(guarded(&self.checkpoints).get(&(tenant_id, source)).copied())
    }

    async fn set_last_sync_at(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
        at: DateTime<Utc>,
    ) -> SyncResult<()> {
        guarded(&self.checkpoints).insert((tenant_id, source), at);
        Ok(())
    }

    async fn list_enabled(&self) -> SyncResult<Vec<SyncSourceConfig>> {
        Ok(guarded(&self.configs)
            .iter()
            .filter(|c| c.enabled)
            .copied()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Product cache
// ---------------------------------------------------------------------------

/// In-memory [`ProductCache`] recording invalidated prefixes.
#[derive(Debug, Default)]
pub struct InMemoryProductCache {
    invalidated: Mutex<Vec<String>>,
}

impl InMemoryProductCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes invalidated so far (test helper).
    #[must_use]
    pub fn invalidated(&self) -> Vec<String> {
        guarded(&self.invalidated).clone()
    }
}

#[async_trait]
impl ProductCache for InMemoryProductCache {
    async fn invalidate_prefix(&self, prefix: &str) -> SyncResult<()> {
        guarded(&self.invalidated).push(prefix.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catalog repository
// ---------------------------------------------------------------------------

/// In-memory [`CatalogRepository`].
#[derive(Debug, Default)]
pub struct InMemoryCatalogRepository {
    products: Mutex<HashMap<Uuid, ProductRecord>>,
}

impl InMemoryCatalogRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored products (test helper).
    #[must_use]
    pub fn len(&self) -> usize {
        guarded(&self.products).len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a record by local id (test helper).
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<ProductRecord> {
        guarded(&self.products).get(&id).cloned()
    }

    /// Overwrite a record's local modification time, simulating an edit
    /// made outside the sync engine (test helper).
    pub fn touch(&self, id: Uuid, updated_at: DateTime<Utc>) {
        if let Some(record) = guarded(&self.products).get_mut(&id) {
            record.updated_at = updated_at;
        }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn find_by_external_id_or_sku(
        &self,
        tenant_id: Uuid,
        external_id: &str,
        sku: Option<&str>,
    ) -> SyncResult<Option<ProductRecord>> {
        let products = guarded(&self.products);

        let by_external = products
            .values()
            .find(|p| p.tenant_id == tenant_id && p.external_id == external_id);
        if let Some(found) = by_external {
            return Ok(Some(found.clone()));
        }

        let Some(sku) = sku else { return Ok(None) };
        Ok(products
            .values()
            .find(|p| p.tenant_id == tenant_id && p.sku.as_deref() == Some(sku))
            .cloned())
    }

    async fn create(&self, product: NewProduct) -> SyncResult<ProductRecord> {
        let now = Utc::now();
        let record = ProductRecord {
            id: Uuid::new_v4(),
            tenant_id: product.tenant_id,
            source: product.source,
            external_id: product.external_id,
            sku: product.sku,
            name: product.name,
            description: product.description,
            price: product.price,
            compare_at_price: product.compare_at_price,
            currency: product.currency,
            stock: product.stock,
            status: product.status,
            categories: product.categories,
            images: product.images,
            last_synced_at: now,
            created_at: now,
            updated_at: now,
        };
        guarded(&self.products).insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> SyncResult<ProductRecord> {
        let mut products = guarded(&self.products);
        let record = products
            .get_mut(&id)
            .ok_or_else(|| SyncError::repository(format!("product not found: {id}")))?;

        if let Some(sku) = patch.sku {
            record.sku = Some(sku);
        }
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(price) = patch.price {
            record.price = price;
        }
        if let Some(compare_at_price) = patch.compare_at_price {
            record.compare_at_price = Some(compare_at_price);
        }
        if let Some(currency) = patch.currency {
            record.currency = currency;
        }
        if let Some(stock) = patch.stock {
            record.stock = stock;
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(categories) = patch.categories {
            record.categories = categories;
        }
        if let Some(images) = patch.images {
            record.images = images;
        }
        if let Some(last_synced_at) = patch.last_synced_at {
            record.last_synced_at = last_synced_at;
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn update_inventory(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
        external_id: &str,
        sku: Option<&str>,
        quantity: i64,
    ) -> SyncResult<bool> {
        let mut products = guarded(&self.products);
        let record = products.values_mut().find(|p| {
            p.tenant_id == tenant_id
                && p.source == source
                && (p.external_id == external_id
                    || (sku.is_some() && p.sku.as_deref() == sku))
        });

        let Some(record) = record else {
            return Ok(false);
        };
        record.stock = quantity;
        record.updated_at = Utc::now();
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Job queue
// ---------------------------------------------------------------------------

/// In-memory [`JobQueue`] collecting enqueued jobs.
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<SyncJob>>,
}

impl InMemoryJobQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs enqueued so far (test helper).
    #[must_use]
    pub fn jobs(&self) -> Vec<SyncJob> {
        guarded(&self.jobs).clone()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: SyncJob) -> SyncResult<()> {
        guarded(&self.jobs).push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_idempotency_acquire_then_duplicate() {
        let store = InMemoryIdempotencyStore::new();

        let first = store.try_acquire("shopify:evt_1", TTL).await.unwrap();
        assert!(first.acquired);

        // In-flight key: not acquired, no stored record yet.
        let in_flight = store.try_acquire("shopify:evt_1", TTL).await.unwrap();
        assert!(!in_flight.acquired);
        assert!(in_flight.existing.is_none());

        store
            .store_response("shopify:evt_1", json!({"ok": true}), 200)
            .await
            .unwrap();

        let duplicate = store.try_acquire("shopify:evt_1", TTL).await.unwrap();
        assert!(!duplicate.acquired);
        let existing = duplicate.existing.unwrap();
        assert_eq!(existing.status_code, 200);
    }

    #[tokio::test]
    async fn test_idempotency_release_allows_retry() {
        let store = InMemoryIdempotencyStore::new();

        assert!(store.try_acquire("k", TTL).await.unwrap().acquired);
        store.release("k").await.unwrap();
        assert!(store.try_acquire("k", TTL).await.unwrap().acquired);
    }

    #[tokio::test]
    async fn test_idempotency_ttl_expiry() {
        let store = InMemoryIdempotencyStore::new();

        assert!(store
            .try_acquire("k", Duration::from_millis(0))
            .await
            .unwrap()
            .acquired);
        // The zero-TTL slot is already expired for the next caller.
        assert!(store.try_acquire("k", TTL).await.unwrap().acquired);
    }

    #[tokio::test]
    async fn test_lock_mutual_exclusion_and_release() {
        let locks = InMemoryLockService::new();

        let won = locks.acquire("sync:t:shopify", TTL, Duration::ZERO).await.unwrap();
        assert!(won.acquired);
        let lost = locks.acquire("sync:t:shopify", TTL, Duration::ZERO).await.unwrap();
        assert!(!lost.acquired);

        let lock_id = won.lock_id.unwrap();
        locks.release("sync:t:shopify", lock_id).await.unwrap();
        assert!(!locks.is_held("sync:t:shopify"));
    }

    #[tokio::test]
    async fn test_lock_release_requires_matching_id() {
        let locks = InMemoryLockService::new();

        let won = locks.acquire("k", TTL, Duration::ZERO).await.unwrap();
        locks.release("k", Uuid::new_v4()).await.unwrap();
        assert!(locks.is_held("k"));

        locks.release("k", won.lock_id.unwrap()).await.unwrap();
        assert!(!locks.is_held("k"));
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_reacquired() {
        let locks = InMemoryLockService::new();

        let stale = locks
            .acquire("k", Duration::from_millis(0), Duration::ZERO)
            .await
            .unwrap();
        let fresh = locks.acquire("k", TTL, Duration::ZERO).await.unwrap();
        assert!(fresh.acquired);

        // The stale holder's release must not free the new instance.
        locks.release("k", stale.lock_id.unwrap()).await.unwrap();
        assert!(locks.is_held("k"));
    }

    #[tokio::test]
    async fn test_config_store_checkpoints() {
        let store = InMemorySyncConfigStore::new();
        let tenant_id = Uuid::new_v4();

        assert!(store
            .last_sync_at(tenant_id, ProductSource::Shopify)
            .await
            .unwrap()
            .is_none());

        let at = Utc::now();
        store
            .set_last_sync_at(tenant_id, ProductSource::Shopify, at)
            .await
            .unwrap();
        assert_eq!(
            store
                .last_sync_at(tenant_id, ProductSource::Shopify)
                .await
                .unwrap(),
            Some(at)
        );
    }

    #[tokio::test]
    async fn test_config_store_lists_only_enabled() {
        let store = InMemorySyncConfigStore::new();
        store.add_config(SyncSourceConfig {
            tenant_id: Uuid::new_v4(),
            source: ProductSource::Shopify,
            enabled: true,
        });
        store.add_config(SyncSourceConfig {
            tenant_id: Uuid::new_v4(),
            source: ProductSource::WooCommerce,
            enabled: false,
        });

        let enabled = store.list_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].source, ProductSource::Shopify);
    }
}

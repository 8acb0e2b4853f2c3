//! Common test utilities for merx-sync integration tests.
//!
//! Provides scripted source clients, a failure-injecting repository
//! wrapper, and payload fixtures for exercising the orchestrator without
//! any real platform or store behind it.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use merx_connector::{
    ConnectorResult, InventoryLevel, NormalizedProduct, ProductFilter, ProductSource,
    ProductStatus, SourceClient,
};
use merx_sync::catalog::{CatalogRepository, NewProduct, ProductPatch, ProductRecord};
use merx_sync::memory::{
    InMemoryCatalogRepository, InMemoryIdempotencyStore, InMemoryLockService,
    InMemoryProductCache, InMemorySyncConfigStore,
};
use merx_sync::{SyncError, SyncOrchestrator, SyncResult};

/// Standard test tenant IDs
pub const TENANT_A: Uuid = Uuid::from_bytes([
    0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11,
]);

pub const TENANT_B: Uuid = Uuid::from_bytes([
    0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22,
]);

static TRACING: Once = Once::new();

/// Route engine logs through the test writer. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A Shopify-shaped product webhook payload.
pub fn shopify_payload(external_id: u64, sku: &str, price: &str, quantity: i64) -> Value {
    json!({
        "id": external_id,
        "title": "Enamel Mug",
        "body_html": "<p>A sturdy mug.</p>",
        "handle": "enamel-mug",
        "status": "active",
        "updated_at": "2025-01-01T00:00:00Z",
        "variants": [
            {
                "id": external_id * 10,
                "sku": sku,
                "title": "Default",
                "price": price,
                "inventory_quantity": quantity
            }
        ]
    })
}

/// A canonical product for scripting bulk fetches.
pub fn normalized(
    external_id: &str,
    sku: Option<&str>,
    price: f64,
    quantity: Option<i64>,
    updated_at: DateTime<Utc>,
) -> NormalizedProduct {
    NormalizedProduct {
        external_id: external_id.into(),
        source: ProductSource::Shopify,
        sku: sku.map(Into::into),
        name: format!("Product {external_id}"),
        description: "Scripted test product.".into(),
        price,
        compare_at_price: None,
        currency: "USD".into(),
        inventory_quantity: quantity,
        categories: Vec::new(),
        images: Vec::new(),
        variants: Vec::new(),
        status: ProductStatus::Active,
        updated_at,
        raw: Value::Null,
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource - preset fetch results, records what was asked
// ---------------------------------------------------------------------------

/// Source client returning preset products/inventory and recording the
/// filters it was called with.
#[derive(Default)]
pub struct ScriptedSource {
    products: Mutex<Vec<NormalizedProduct>>,
    inventory: Mutex<Vec<InventoryLevel>>,
    seen_filters: Mutex<Vec<ProductFilter>>,
    fetch_count: AtomicU32,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<NormalizedProduct>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    pub fn with_inventory(inventory: Vec<InventoryLevel>) -> Self {
        Self {
            inventory: Mutex::new(inventory),
            ..Self::default()
        }
    }

    /// Delay each fetch, to hold the sync lock while another job runs.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the scripted product set.
    pub fn set_products(&self, products: Vec<NormalizedProduct>) {
        *self.products.lock().unwrap() = products;
    }

    /// Replace the scripted inventory rows.
    pub fn set_inventory(&self, inventory: Vec<InventoryLevel>) {
        *self.inventory.lock().unwrap() = inventory;
    }

    /// Number of product fetches performed.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Filters the orchestrator passed to `fetch_products`.
    pub fn seen_filters(&self) -> Vec<ProductFilter> {
        self.seen_filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceClient for ScriptedSource {
    async fn fetch_products(
        &self,
        _tenant_id: Uuid,
        _source: ProductSource,
        filter: &ProductFilter,
    ) -> ConnectorResult<Vec<NormalizedProduct>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.seen_filters.lock().unwrap().push(*filter);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.products.lock().unwrap().clone())
    }

    async fn fetch_inventory(
        &self,
        _tenant_id: Uuid,
        _source: ProductSource,
    ) -> ConnectorResult<Vec<InventoryLevel>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.inventory.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// FlakyRepository - failure injection around the in-memory repository
// ---------------------------------------------------------------------------

/// Repository wrapper that fails writes for chosen external ids.
pub struct FlakyRepository {
    inner: Arc<InMemoryCatalogRepository>,
    fail_external_ids: Mutex<HashSet<String>>,
}

impl FlakyRepository {
    pub fn new(inner: Arc<InMemoryCatalogRepository>) -> Self {
        Self {
            inner,
            fail_external_ids: Mutex::new(HashSet::new()),
        }
    }

    /// Make writes for `external_id` fail with a repository error.
    pub fn fail_writes_for(&self, external_id: &str) {
        self.fail_external_ids
            .lock()
            .unwrap()
            .insert(external_id.to_string());
    }

    /// Stop failing writes for `external_id`.
    pub fn heal(&self, external_id: &str) {
        self.fail_external_ids.lock().unwrap().remove(external_id);
    }

    fn check(&self, external_id: &str) -> SyncResult<()> {
        if self.fail_external_ids.lock().unwrap().contains(external_id) {
            return Err(SyncError::repository(format!(
                "injected write failure for {external_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for FlakyRepository {
    async fn find_by_external_id_or_sku(
        &self,
        tenant_id: Uuid,
        external_id: &str,
        sku: Option<&str>,
    ) -> SyncResult<Option<ProductRecord>> {
        self.inner
            .find_by_external_id_or_sku(tenant_id, external_id, sku)
            .await
    }

    async fn create(&self, product: NewProduct) -> SyncResult<ProductRecord> {
        self.check(&product.external_id)?;
        self.inner.create(product).await
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> SyncResult<ProductRecord> {
        if let Some(record) = self.inner.get(id) {
            self.check(&record.external_id)?;
        }
        self.inner.update(id, patch).await
    }

    async fn update_inventory(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
        external_id: &str,
        sku: Option<&str>,
        quantity: i64,
    ) -> SyncResult<bool> {
        self.check(external_id)?;
        self.inner
            .update_inventory(tenant_id, source, external_id, sku, quantity)
            .await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// All the in-memory ports behind one orchestrator.
pub struct Harness {
    pub repository: Arc<InMemoryCatalogRepository>,
    pub flaky: Arc<FlakyRepository>,
    pub source: Arc<ScriptedSource>,
    pub idempotency: Arc<InMemoryIdempotencyStore>,
    pub locks: Arc<InMemoryLockService>,
    pub cache: Arc<InMemoryProductCache>,
    pub configs: Arc<InMemorySyncConfigStore>,
    pub orchestrator: SyncOrchestrator,
}

impl Harness {
    pub fn new(source: ScriptedSource) -> Self {
        let repository = Arc::new(InMemoryCatalogRepository::new());
        let flaky = Arc::new(FlakyRepository::new(Arc::clone(&repository)));
        let source = Arc::new(source);
        let idempotency = Arc::new(InMemoryIdempotencyStore::new());
        let locks = Arc::new(InMemoryLockService::new());
        let cache = Arc::new(InMemoryProductCache::new());
        let configs = Arc::new(InMemorySyncConfigStore::new());

        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&flaky) as Arc<dyn CatalogRepository>,
            Arc::clone(&source) as Arc<dyn SourceClient>,
            Arc::clone(&idempotency) as Arc<dyn merx_sync::IdempotencyStore>,
            Arc::clone(&locks) as Arc<dyn merx_sync::LockService>,
            Arc::clone(&cache) as Arc<dyn merx_sync::ProductCache>,
            Arc::clone(&configs) as Arc<dyn merx_sync::SyncConfigStore>,
        );

        Self {
            repository,
            flaky,
            source,
            idempotency,
            locks,
            cache,
            configs,
            orchestrator,
        }
    }
}

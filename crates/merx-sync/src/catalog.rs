//! Local catalog records and the repository port.
//!
//! The local product is the system of record, keyed by
//! `(tenant_id, external_id)` with `sku` as a secondary lookup key. It is
//! created and mutated exclusively by the item syncer; this engine never
//! deletes records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use merx_connector::{ProductSource, ProductStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncResult;

/// A product in the local catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Local id.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Platform the record was synchronized from.
    pub source: ProductSource,
    /// Identifier in the source platform; the authoritative link key.
    pub external_id: String,
    /// SKU; secondary lookup key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Current price.
    pub price: f64,
    /// Strike-through price, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<f64>,
    /// ISO 4217 currency code.
    pub currency: String,
    /// On-hand stock.
    pub stock: i64,
    /// Publication status.
    pub status: ProductStatus,
    /// Category names.
    pub categories: Vec<String>,
    /// Image URLs.
    pub images: Vec<String>,
    /// When this record last matched the source.
    pub last_synced_at: DateTime<Utc>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last modified locally.
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a local product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub tenant_id: Uuid,
    pub source: ProductSource,
    pub external_id: String,
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub currency: String,
    pub stock: i64,
    pub status: ProductStatus,
    pub categories: Vec<String>,
    pub images: Vec<String>,
}

/// Partial update of a local product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub compare_at_price: Option<f64>,
    pub currency: Option<String>,
    pub stock: Option<i64>,
    pub status: Option<ProductStatus>,
    pub categories: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Repository port for the local catalog. Implementations (the relational
/// store) live outside this engine.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Find a product by external id, falling back to SKU when no
    /// external id match exists.
    async fn find_by_external_id_or_sku(
        &self,
        tenant_id: Uuid,
        external_id: &str,
        sku: Option<&str>,
    ) -> SyncResult<Option<ProductRecord>>;

    /// Create a product.
    async fn create(&self, product: NewProduct) -> SyncResult<ProductRecord>;

    /// Apply a partial update.
    async fn update(&self, id: Uuid, patch: ProductPatch) -> SyncResult<ProductRecord>;

    /// Overwrite the stock of the product matching external id or SKU.
    /// Returns `false` when no product matches.
    async fn update_inventory(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
        external_id: &str,
        sku: Option<&str>,
        quantity: i64,
    ) -> SyncResult<bool>;
}

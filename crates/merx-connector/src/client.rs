//! Source client port.
//!
//! The sync engine fetches candidate products and inventory through this
//! trait; concrete implementations (HTTP clients per platform) live with
//! the platform integrations, not here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConnectorResult;
use crate::product::{InventoryLevel, NormalizedProduct};
use crate::source::ProductSource;

/// Filter narrowing a product fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Only return products modified strictly after this instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_after: Option<DateTime<Utc>>,
}

impl ProductFilter {
    /// Filter for a delta fetch bounded below by `updated_after`.
    #[must_use]
    pub fn since(updated_after: DateTime<Utc>) -> Self {
        Self {
            updated_after: Some(updated_after),
        }
    }

    /// Unbounded filter (full catalog fetch).
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}

/// Client for fetching catalog data from an external platform.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch the candidate product set for a tenant, already normalized
    /// into the canonical shape.
    async fn fetch_products(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
        filter: &ProductFilter,
    ) -> ConnectorResult<Vec<NormalizedProduct>>;

    /// Fetch current inventory levels for a tenant.
    async fn fetch_inventory(
        &self,
        tenant_id: Uuid,
        source: ProductSource,
    ) -> ConnectorResult<Vec<InventoryLevel>>;
}

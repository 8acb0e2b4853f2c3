//! Per-item synchronization.
//!
//! Applies the create/update/skip decision for one normalized product
//! against the catalog repository. Persistence errors propagate to the
//! orchestrator, which owns failure isolation for the batch.

use std::sync::Arc;

use merx_connector::NormalizedProduct;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::catalog::{CatalogRepository, NewProduct, ProductPatch};
use crate::conflict::ProductConflict;
use crate::error::SyncResult;
use crate::job::ConflictPolicy;

/// What happened to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// A local record was created.
    Created,
    /// A local record was overwritten.
    Updated,
    /// The item was intentionally left untouched.
    Skipped,
    /// Reserved: no current source path produces deletion.
    Deleted,
}

impl SyncAction {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Created => "created",
            SyncAction::Updated => "updated",
            SyncAction::Skipped => "skipped",
            SyncAction::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of syncing one item.
///
/// `inventory_updated` and `price_updated` track field-level change
/// (pre/post comparison), independently of the action verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// The create/update/skip verdict.
    pub action: SyncAction,
    /// Whether the stored stock actually changed.
    pub inventory_updated: bool,
    /// Whether the stored price actually changed.
    pub price_updated: bool,
    /// Conflict flagged for review, when the policy called for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ProductConflict>,
}

/// Applies one normalized product to the local catalog.
#[derive(Clone)]
pub struct ItemSyncer {
    repository: Arc<dyn CatalogRepository>,
}

impl ItemSyncer {
    /// Create a new item syncer.
    #[must_use]
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository }
    }

    /// Apply the create/update/skip decision for one product.
    ///
    /// Lookup is by external id first, falling back to SKU — the external
    /// id is the authoritative link key.
    #[instrument(skip(self, incoming), fields(external_id = %incoming.external_id))]
    pub async fn sync_one(
        &self,
        tenant_id: Uuid,
        incoming: &NormalizedProduct,
        policy: ConflictPolicy,
    ) -> SyncResult<ItemOutcome> {
        let existing = self
            .repository
            .find_by_external_id_or_sku(tenant_id, &incoming.external_id, incoming.sku.as_deref())
            .await?;

        let Some(local) = existing else {
            return self.create(tenant_id, incoming).await;
        };

        if local.updated_at > incoming.updated_at && policy == ConflictPolicy::FlagForReview {
            debug!(
                product_id = %local.id,
                local_updated_at = %local.updated_at,
                source_updated_at = %incoming.updated_at,
                "local record newer than source, flagging for review"
            );
            return Ok(ItemOutcome {
                action: SyncAction::Skipped,
                inventory_updated: false,
                price_updated: false,
                conflict: Some(ProductConflict::flagged(&local, incoming)),
            });
        }

        let pre_stock = local.stock;
        let pre_price = local.price;

        let patch = ProductPatch {
            sku: incoming.sku.clone(),
            name: Some(incoming.name.clone()),
            description: Some(incoming.description.clone()),
            price: Some(incoming.price),
            compare_at_price: incoming.compare_at_price,
            currency: Some(incoming.currency.clone()),
            stock: incoming.inventory_quantity,
            status: Some(incoming.status),
            categories: Some(incoming.categories.clone()),
            images: Some(incoming.images.clone()),
            last_synced_at: Some(chrono::Utc::now()),
        };
        let updated = self.repository.update(local.id, patch).await?;

        Ok(ItemOutcome {
            action: SyncAction::Updated,
            inventory_updated: updated.stock != pre_stock,
            price_updated: (updated.price - pre_price).abs() > f64::EPSILON,
            conflict: None,
        })
    }

    async fn create(
        &self,
        tenant_id: Uuid,
        incoming: &NormalizedProduct,
    ) -> SyncResult<ItemOutcome> {
        // Stock defaults to zero when the source does not track inventory.
        let stock = incoming.inventory_quantity.unwrap_or(0);

        let created = self
            .repository
            .create(NewProduct {
                tenant_id,
                source: incoming.source,
                external_id: incoming.external_id.clone(),
                sku: incoming.sku.clone(),
                name: incoming.name.clone(),
                description: incoming.description.clone(),
                price: incoming.price,
                compare_at_price: incoming.compare_at_price,
                currency: incoming.currency.clone(),
                stock,
                status: incoming.status,
                categories: incoming.categories.clone(),
                images: incoming.images.clone(),
            })
            .await?;

        debug!(product_id = %created.id, "created local product");

        Ok(ItemOutcome {
            action: SyncAction::Created,
            inventory_updated: created.stock != 0,
            price_updated: created.price.abs() > f64::EPSILON,
            conflict: None,
        })
    }
}

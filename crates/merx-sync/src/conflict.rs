//! Conflict detection between local records and incoming source data.
//!
//! A conflict is only ever *flagged*, never auto-merged, and only under
//! [`ConflictPolicy::FlagForReview`] when the local record is newer than
//! the incoming data. Every other policy/timestamp combination resolves
//! silently by overwriting in the item syncer.

use chrono::{DateTime, Utc};
use merx_connector::NormalizedProduct;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::catalog::ProductRecord;
use crate::job::ConflictPolicy;

/// One field whose local and source values disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConflict {
    /// Field name.
    pub field: String,
    /// Current local value.
    pub local_value: serde_json::Value,
    /// Incoming source value.
    pub source_value: serde_json::Value,
    /// When the local record was last modified.
    pub local_updated_at: DateTime<Utc>,
    /// When the source copy was last modified.
    pub source_updated_at: DateTime<Utc>,
}

/// A flagged conflict for one product, emitted under
/// [`ConflictPolicy::FlagForReview`] when local is newer than source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConflict {
    /// Local product id.
    pub product_id: Uuid,
    /// External id of the product in the source platform.
    pub external_id: String,
    /// SKU, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Fields that disagree.
    pub fields: Vec<FieldConflict>,
    /// Suggested way out for the reviewer.
    pub suggested_resolution: ConflictPolicy,
}

impl ProductConflict {
    /// Build the conflict record for a local record that is newer than
    /// the incoming copy.
    #[must_use]
    pub fn flagged(local: &ProductRecord, incoming: &NormalizedProduct) -> Self {
        Self {
            product_id: local.id,
            external_id: local.external_id.clone(),
            sku: local.sku.clone().or_else(|| incoming.sku.clone()),
            fields: detect_field_conflicts(local, incoming),
            suggested_resolution: ConflictPolicy::NewestWins,
        }
    }
}

/// Compare the synchronized fields of a local record against incoming
/// source data.
#[must_use]
pub fn detect_field_conflicts(
    local: &ProductRecord,
    incoming: &NormalizedProduct,
) -> Vec<FieldConflict> {
    let mut fields = Vec::new();
    let mut push = |field: &str, local_value: serde_json::Value, source_value: serde_json::Value| {
        if local_value != source_value {
            fields.push(FieldConflict {
                field: field.to_string(),
                local_value,
                source_value,
                local_updated_at: local.updated_at,
                source_updated_at: incoming.updated_at,
            });
        }
    };

    push("name", json!(local.name), json!(incoming.name));
    push(
        "description",
        json!(local.description),
        json!(incoming.description),
    );
    push("price", json!(local.price), json!(incoming.price));
    if let Some(quantity) = incoming.inventory_quantity {
        push("stock", json!(local.stock), json!(quantity));
    }
    push(
        "status",
        json!(local.status.as_str()),
        json!(incoming.status.as_str()),
    );

    fields
}

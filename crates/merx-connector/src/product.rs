//! Canonical product model.
//!
//! Every platform payload is normalized into [`NormalizedProduct`] before
//! the sync engine looks at it. The canonical shape is ephemeral: it exists
//! for the duration of one sync pass and is never persisted as-is (the
//! original payload travels along in `raw` for audit).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::source::ProductSource;

/// Publication status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Visible and purchasable.
    Active,
    /// Hidden from the storefront.
    Draft,
}

impl ProductStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = std::convert::Infallible;

    /// Platform statuses vary widely; anything not recognizably "live"
    /// parses to [`ProductStatus::Draft`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "active" | "publish" | "published" | "visible" => ProductStatus::Active,
            _ => ProductStatus::Draft,
        })
    }
}

/// One purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Identifier of the variant in the source platform.
    pub external_id: String,
    /// Stock keeping unit, when the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Variant title (e.g. "Red / Large").
    pub title: String,
    /// Variant price in the product currency.
    pub price: f64,
    /// On-hand quantity, when the platform tracks it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<i64>,
    /// Option name/value pairs (e.g. "color" -> "red").
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Canonical product shape produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    /// Identifier of the product in the source platform.
    pub external_id: String,
    /// Platform the product came from.
    pub source: ProductSource,
    /// SKU of the primary variant, falling back to a handle/slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Product name.
    pub name: String,
    /// Product description (may contain markup from the source).
    pub description: String,
    /// Price of the primary variant. Unparseable prices normalize to 0.0.
    pub price: f64,
    /// Strike-through price, when the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<f64>,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Total on-hand quantity, when the platform tracks it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<i64>,
    /// Category names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Purchasable variants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ProductVariant>,
    /// Publication status.
    pub status: ProductStatus,
    /// When the product was last modified in the source platform.
    pub updated_at: DateTime<Utc>,
    /// Original payload, retained for audit.
    pub raw: serde_json::Value,
}

/// Inventory quantity for one product, as reported by a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    /// Identifier of the product in the source platform.
    pub external_id: String,
    /// SKU, when the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// On-hand quantity.
    pub quantity: i64,
}

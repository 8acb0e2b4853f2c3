//! Shopify product payload mapping.
//!
//! Handles the shape shared by Shopify product webhooks
//! (`products/create`, `products/update`) and the REST Admin API.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;

use super::{id_field, parse_opt_price, parse_price, parse_quantity, parse_timestamp, str_field, url_list};
use crate::product::{NormalizedProduct, ProductStatus, ProductVariant};
use crate::source::ProductSource;

pub(super) fn normalize(payload: &Value, base_currency: &str) -> Option<NormalizedProduct> {
    let external_id = id_field(payload, "id")?;
    let name = str_field(payload, "title")?.to_string();

    let variants = parse_variants(payload.get("variants"));
    let primary = variants.first();

    // SKU falls back to the product handle when the primary variant has none.
    let sku = primary
        .and_then(|v| v.sku.clone())
        .or_else(|| str_field(payload, "handle").map(ToString::to_string));

    let price = primary.map_or_else(
        || parse_price(payload.get("price")),
        |v| v.price,
    );
    let compare_at_price = payload
        .get("variants")
        .and_then(|v| v.get(0))
        .and_then(|v| parse_opt_price(v.get("compare_at_price")));

    // Shopify tracks inventory per variant; the product-level quantity is
    // the sum over variants that report one.
    let tracked: Vec<i64> = variants
        .iter()
        .filter_map(|v| v.inventory_quantity)
        .collect();
    let inventory_quantity = if tracked.is_empty() {
        None
    } else {
        Some(tracked.iter().sum())
    };

    let mut categories: Vec<String> = Vec::new();
    if let Some(product_type) = str_field(payload, "product_type") {
        categories.push(product_type.to_string());
    }
    if let Some(tags) = str_field(payload, "tags") {
        categories.extend(
            tags.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string),
        );
    }

    let status = str_field(payload, "status")
        .map(|s| s.parse().unwrap_or(ProductStatus::Draft))
        .unwrap_or(ProductStatus::Active);

    Some(NormalizedProduct {
        external_id,
        source: ProductSource::Shopify,
        sku,
        name,
        description: str_field(payload, "body_html").unwrap_or_default().to_string(),
        price,
        compare_at_price,
        currency: str_field(payload, "currency")
            .unwrap_or(base_currency)
            .to_string(),
        inventory_quantity,
        categories,
        images: url_list(payload.get("images"), &["src"]),
        variants,
        status,
        updated_at: parse_timestamp(payload.get("updated_at")).unwrap_or_else(Utc::now),
        raw: payload.clone(),
    })
}

fn parse_variants(value: Option<&Value>) -> Vec<ProductVariant> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let external_id = id_field(item, "id")?;
            let mut options = BTreeMap::new();
            for key in ["option1", "option2", "option3"] {
                if let Some(v) = str_field(item, key) {
                    options.insert(key.to_string(), v.to_string());
                }
            }
            Some(ProductVariant {
                external_id,
                sku: str_field(item, "sku").map(ToString::to_string),
                title: str_field(item, "title").unwrap_or("Default").to_string(),
                price: parse_price(item.get("price")),
                inventory_quantity: parse_quantity(item.get("inventory_quantity")),
                options,
            })
        })
        .collect()
}

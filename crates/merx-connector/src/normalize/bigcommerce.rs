//! BigCommerce product payload mapping.
//!
//! Handles the Catalog v3 product shape used by both the API and product
//! webhooks (after the webhook's id-only stub has been hydrated).

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;

use super::{id_field, parse_opt_price, parse_price, parse_quantity, parse_timestamp, str_field, url_list};
use crate::product::{NormalizedProduct, ProductStatus, ProductVariant};
use crate::source::ProductSource;

pub(super) fn normalize(payload: &Value, base_currency: &str) -> Option<NormalizedProduct> {
    let external_id = id_field(payload, "id")?;
    let name = str_field(payload, "name")?.to_string();

    let variants = parse_variants(payload.get("variants"));

    let sku = str_field(payload, "sku")
        .map(ToString::to_string)
        .or_else(|| variants.first().and_then(|v| v.sku.clone()))
        .or_else(|| slug_from_custom_url(payload));

    // BigCommerce category references are numeric ids; keep them as
    // strings until the caller resolves names.
    let categories = match payload.get("categories") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|c| match c {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let status = match payload.get("is_visible") {
        Some(Value::Bool(false)) => ProductStatus::Draft,
        _ => ProductStatus::Active,
    };

    Some(NormalizedProduct {
        external_id,
        source: ProductSource::BigCommerce,
        sku,
        name,
        description: str_field(payload, "description").unwrap_or_default().to_string(),
        price: parse_price(payload.get("price")),
        compare_at_price: parse_opt_price(payload.get("retail_price")),
        currency: str_field(payload, "currency")
            .unwrap_or(base_currency)
            .to_string(),
        inventory_quantity: parse_quantity(payload.get("inventory_level")),
        categories,
        images: url_list(payload.get("images"), &["url_standard", "url_zoom"]),
        variants,
        status,
        updated_at: parse_timestamp(payload.get("date_modified")).unwrap_or_else(Utc::now),
        raw: payload.clone(),
    })
}

fn slug_from_custom_url(payload: &Value) -> Option<String> {
    let url = payload.get("custom_url").and_then(|u| u.get("url"))?.as_str()?;
    let slug = url.trim_matches('/');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
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
            if let Some(Value::Array(values)) = item.get("option_values") {
                for ov in values {
                    if let (Some(name), Some(label)) =
                        (str_field(ov, "option_display_name"), str_field(ov, "label"))
                    {
                        options.insert(name.to_lowercase(), label.to_string());
                    }
                }
            }
            let title = if options.is_empty() {
                "Default".to_string()
            } else {
                options.values().cloned().collect::<Vec<_>>().join(" / ")
            };
            Some(ProductVariant {
                external_id,
                sku: str_field(item, "sku").map(ToString::to_string),
                title,
                price: parse_price(item.get("price")),
                inventory_quantity: parse_quantity(item.get("inventory_level")),
                options,
            })
        })
        .collect()
}

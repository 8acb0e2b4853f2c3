//! WooCommerce product payload mapping.
//!
//! Handles the WooCommerce REST v3 product shape, which is also what the
//! product webhooks deliver. Variation details are separate API objects
//! in WooCommerce, so normalized products from this source carry no
//! embedded variants.

use chrono::Utc;
use serde_json::Value;

use super::{id_field, parse_opt_price, parse_price, parse_quantity, parse_timestamp, str_field, url_list};
use crate::product::{NormalizedProduct, ProductStatus};
use crate::source::ProductSource;

pub(super) fn normalize(payload: &Value, base_currency: &str) -> Option<NormalizedProduct> {
    let external_id = id_field(payload, "id")?;
    let name = str_field(payload, "name")?.to_string();

    // `price` is the effective price; when a sale is running the regular
    // price doubles as the strike-through price.
    let price = parse_price(payload.get("price").or_else(|| payload.get("regular_price")));
    let sale_price = parse_opt_price(payload.get("sale_price"));
    let regular_price = parse_opt_price(payload.get("regular_price"));
    let compare_at_price = match (sale_price, regular_price) {
        (Some(_), Some(regular)) if regular > price => Some(regular),
        _ => None,
    };

    let sku = str_field(payload, "sku")
        .or_else(|| str_field(payload, "slug"))
        .map(ToString::to_string);

    let categories = match payload.get("categories") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|c| str_field(c, "name"))
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let status = str_field(payload, "status")
        .map(|s| s.parse().unwrap_or(ProductStatus::Draft))
        .unwrap_or(ProductStatus::Active);

    Some(NormalizedProduct {
        external_id,
        source: ProductSource::WooCommerce,
        sku,
        name,
        description: str_field(payload, "description").unwrap_or_default().to_string(),
        price,
        compare_at_price,
        currency: str_field(payload, "currency")
            .unwrap_or(base_currency)
            .to_string(),
        inventory_quantity: parse_quantity(payload.get("stock_quantity")),
        categories,
        images: url_list(payload.get("images"), &["src"]),
        variants: Vec::new(),
        status,
        updated_at: parse_timestamp(payload.get("date_modified_gmt"))
            .or_else(|| parse_timestamp(payload.get("date_modified")))
            .unwrap_or_else(Utc::now),
        raw: payload.clone(),
    })
}

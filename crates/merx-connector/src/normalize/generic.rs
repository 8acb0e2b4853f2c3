//! Best-effort mapping for custom and unrecognized platforms.
//!
//! Guesses common field names rather than failing, so a tenant wiring up
//! a home-grown storefront still gets a usable canonical product.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;

use super::{id_field, parse_opt_price, parse_price, parse_quantity, parse_timestamp, str_field, url_list};
use crate::product::{NormalizedProduct, ProductStatus, ProductVariant};
use crate::source::ProductSource;

const ID_KEYS: &[&str] = &["id", "external_id", "product_id", "uid"];
const NAME_KEYS: &[&str] = &["name", "title"];
const DESCRIPTION_KEYS: &[&str] = &["description", "body_html", "body", "summary"];
const PRICE_KEYS: &[&str] = &["price", "amount", "unit_price"];
const COMPARE_KEYS: &[&str] = &["compare_at_price", "list_price", "regular_price"];
const CURRENCY_KEYS: &[&str] = &["currency", "currency_code"];
const SKU_KEYS: &[&str] = &["sku", "code"];
const SLUG_KEYS: &[&str] = &["slug", "handle"];
const QUANTITY_KEYS: &[&str] = &["inventory_quantity", "stock_quantity", "quantity", "stock", "inventory"];
const UPDATED_KEYS: &[&str] = &["updated_at", "updatedAt", "date_modified", "modified_at", "last_modified"];

pub(super) fn normalize(payload: &Value, base_currency: &str) -> Option<NormalizedProduct> {
    if !payload.is_object() {
        return None;
    }

    let external_id = ID_KEYS.iter().find_map(|key| id_field(payload, key))?;
    let name = NAME_KEYS
        .iter()
        .find_map(|key| str_field(payload, key))?
        .to_string();

    let sku = SKU_KEYS
        .iter()
        .chain(SLUG_KEYS)
        .find_map(|key| str_field(payload, key))
        .map(ToString::to_string);

    let status = str_field(payload, "status")
        .map(|s| s.parse().unwrap_or(ProductStatus::Draft))
        .unwrap_or(ProductStatus::Active);

    Some(NormalizedProduct {
        external_id,
        source: ProductSource::Custom,
        sku,
        name,
        description: DESCRIPTION_KEYS
            .iter()
            .find_map(|key| str_field(payload, key))
            .unwrap_or_default()
            .to_string(),
        price: parse_price(first_present(payload, PRICE_KEYS)),
        compare_at_price: parse_opt_price(first_present(payload, COMPARE_KEYS)),
        currency: CURRENCY_KEYS
            .iter()
            .find_map(|key| str_field(payload, key))
            .unwrap_or(base_currency)
            .to_string(),
        inventory_quantity: parse_quantity(first_present(payload, QUANTITY_KEYS)),
        categories: parse_categories(payload),
        images: url_list(payload.get("images"), &["src", "url"]),
        variants: parse_variants(payload.get("variants")),
        status,
        updated_at: parse_timestamp(first_present(payload, UPDATED_KEYS)).unwrap_or_else(Utc::now),
        raw: payload.clone(),
    })
}

fn first_present<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| payload.get(*key))
}

fn parse_categories(payload: &Value) -> Vec<String> {
    let value = payload.get("categories").or_else(|| payload.get("tags"));
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(_) => str_field(item, "name").map(ToString::to_string),
            _ => None,
        })
        .collect()
}

fn parse_variants(value: Option<&Value>) -> Vec<ProductVariant> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let external_id = ID_KEYS.iter().find_map(|key| id_field(item, key))?;
            Some(ProductVariant {
                external_id,
                sku: SKU_KEYS
                    .iter()
                    .find_map(|key| str_field(item, key))
                    .map(ToString::to_string),
                title: NAME_KEYS
                    .iter()
                    .find_map(|key| str_field(item, key))
                    .unwrap_or("Default")
                    .to_string(),
                price: parse_price(first_present(item, PRICE_KEYS)),
                inventory_quantity: parse_quantity(first_present(item, QUANTITY_KEYS)),
                options: BTreeMap::new(),
            })
        })
        .collect()
}

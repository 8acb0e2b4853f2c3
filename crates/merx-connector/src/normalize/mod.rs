//! Payload normalization.
//!
//! Maps each platform's webhook/API payload shape into the canonical
//! [`NormalizedProduct`]. Dispatch is a tagged match on [`ProductSource`]:
//! one parser per platform plus a generic best-effort fallback, all
//! returning the same canonical struct.
//!
//! Parsing is defensive throughout: an unparseable or missing price
//! becomes `0.0`, a missing currency becomes the configured base
//! currency, and a missing SKU falls back to the platform's handle/slug.
//! A payload that cannot be read as a product event at all yields `None`,
//! which callers must treat as a no-op rather than a failure.

pub mod bigcommerce;
pub mod generic;
pub mod shopify;
pub mod woocommerce;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::product::NormalizedProduct;
use crate::source::ProductSource;

/// Normalize a raw platform payload into the canonical product shape.
///
/// Returns `None` when the payload is not interpretable as a product
/// event (wrong entity type, missing identifier, not an object).
#[must_use]
pub fn normalize(
    source: ProductSource,
    base_currency: &str,
    payload: &Value,
) -> Option<NormalizedProduct> {
    let product = match source {
        ProductSource::Shopify => shopify::normalize(payload, base_currency),
        ProductSource::WooCommerce => woocommerce::normalize(payload, base_currency),
        ProductSource::BigCommerce => bigcommerce::normalize(payload, base_currency),
        ProductSource::Custom => generic::normalize(payload, base_currency),
    };

    if product.is_none() {
        debug!(source = %source, "payload not interpretable as a product event");
    }

    product
}

/// Parse a price value, defaulting to `0.0` when absent or unparseable.
pub(crate) fn parse_price(value: Option<&Value>) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// Parse an optional price, treating absent, unparseable, and
/// non-positive values as "not provided".
pub(crate) fn parse_opt_price(value: Option<&Value>) -> Option<f64> {
    parse_number(value).filter(|p| *p > 0.0)
}

fn parse_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parse an inventory quantity. Quantities arrive as numbers or numeric
/// strings depending on the platform.
pub(crate) fn parse_quantity(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a modification timestamp. Accepts RFC 3339 and the naive
/// `YYYY-MM-DDTHH:MM:SS` form some platforms emit for GMT fields.
pub(crate) fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = value?.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Read a string field, treating empty strings as absent.
pub(crate) fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// Read an external id field that may be a number or a string.
pub(crate) fn id_field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Collect image URLs from an array of strings or an array of objects
/// carrying one of the given keys.
pub(crate) fn url_list(value: Option<&Value>, keys: &[&str]) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(_) => keys
                .iter()
                .find_map(|key| str_field(item, key))
                .map(ToString::to_string),
            _ => None,
        })
        .collect()
}

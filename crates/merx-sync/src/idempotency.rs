//! Webhook idempotency.
//!
//! Guarantees at-most-once application of a webhook event even under
//! queue redelivery. The store is a shared keyed service with TTL
//! semantics; this module defines the protocol for using one, not the
//! store itself.
//!
//! Three outcomes must never be conflated:
//! - duplicate: a completed record exists under the key — skip;
//! - first processing succeeded — store the response under the key;
//! - first processing aborted — release the key so a genuine retry is
//!   not permanently blocked.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use merx_connector::ProductSource;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::SyncResult;
use crate::job::WebhookEvent;

/// Response stored under an idempotency key after first successful
/// processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// The idempotency key.
    pub key: String,
    /// The stored response payload.
    pub response: serde_json::Value,
    /// Status code of the stored response.
    pub status_code: u16,
    /// When the response was stored.
    pub stored_at: DateTime<Utc>,
}

/// Outcome of an acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquireOutcome {
    /// Whether this caller now owns the key.
    pub acquired: bool,
    /// The stored record, when a completed duplicate exists.
    pub existing: Option<IdempotencyRecord>,
}

/// Keyed idempotency store with TTL semantics. Acquisition is atomic:
/// concurrent attempts for the same key serialize here.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Attempt to acquire the key. Not acquired means either a completed
    /// record exists (returned in `existing`) or another worker holds the
    /// key in flight.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> SyncResult<AcquireOutcome>;

    /// Store the response for a successfully processed event, so future
    /// redeliveries can short-circuit.
    async fn store_response(
        &self,
        key: &str,
        response: serde_json::Value,
        status_code: u16,
    ) -> SyncResult<()>;

    /// Release a key whose processing aborted before completion.
    async fn release(&self, key: &str) -> SyncResult<()>;
}

/// Derive the idempotency key for a webhook event.
///
/// Prefers the platform's explicit idempotency key, then the event id,
/// then a SHA-256 over the canonicalized payload (sorted keys), so that
/// even bare redeliveries of an identical payload deduplicate.
#[must_use]
pub fn derive_key(source: ProductSource, event: &WebhookEvent) -> String {
    let dedupe = event
        .idempotency_key
        .clone()
        .or_else(|| event.event_id.clone())
        .unwrap_or_else(|| payload_fingerprint(&event.payload));
    format!("{source}:{dedupe}")
}

fn payload_fingerprint(payload: &serde_json::Value) -> String {
    let canonical = sort_json_keys(payload).to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recursively sort object keys for a canonical representation.
fn sort_json_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_json_keys(v)))
                .collect();
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sort_json_keys).collect())
        }
        other => other.clone(),
    }
}

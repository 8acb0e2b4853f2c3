//! Sync job definitions.
//!
//! A [`SyncJob`] is the immutable unit of work consumed by the
//! orchestrator. Jobs arrive from the queue transport (webhook handlers,
//! the scheduler, or operators triggering a re-sync) and are consumed
//! exactly once — modulo queue-level redelivery, which the idempotency
//! guard absorbs for webhook jobs.

use chrono::{DateTime, Utc};
use merx_connector::ProductSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

/// How a sync job traverses the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Apply a single webhook event.
    Webhook,
    /// Sync records changed after a checkpoint timestamp.
    Delta,
    /// Re-evaluate the whole catalog.
    Full,
    /// Overwrite inventory quantities only.
    Inventory,
}

impl SyncMode {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Webhook => "webhook",
            SyncMode::Delta => "delta",
            SyncMode::Full => "full",
            SyncMode::Inventory => "inventory",
        }
    }

    /// Whether this mode runs under the bulk sync lock.
    #[must_use]
    pub fn is_bulk(&self) -> bool {
        !matches!(self, SyncMode::Webhook)
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webhook" => Ok(SyncMode::Webhook),
            "delta" => Ok(SyncMode::Delta),
            "full" => Ok(SyncMode::Full),
            "inventory" => Ok(SyncMode::Inventory),
            _ => Err(format!("Unknown sync mode: {s}")),
        }
    }
}

/// Rule deciding which side wins when local and source data disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Source data always wins.
    SourceWins,
    /// The side with the newer `updated_at` wins.
    NewestWins,
    /// When local is newer, preserve it and flag the item for review.
    FlagForReview,
}

impl ConflictPolicy {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::SourceWins => "source_wins",
            ConflictPolicy::NewestWins => "newest_wins",
            ConflictPolicy::FlagForReview => "flag_for_review",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "source_wins" => Ok(ConflictPolicy::SourceWins),
            "newest_wins" => Ok(ConflictPolicy::NewestWins),
            "flag_for_review" => Ok(ConflictPolicy::FlagForReview),
            _ => Err(format!("Unknown conflict policy: {s}")),
        }
    }
}

/// Payload of an inbound webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Idempotency key supplied by the platform, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Platform event id, used for deduplication when no explicit
    /// idempotency key is supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Raw event payload.
    pub payload: serde_json::Value,
}

impl WebhookEvent {
    /// Event deduplicated by an explicit idempotency key.
    #[must_use]
    pub fn with_key(key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            idempotency_key: Some(key.into()),
            event_id: None,
            payload,
        }
    }

    /// Event deduplicated by the platform's event id.
    #[must_use]
    pub fn with_event_id(event_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            idempotency_key: None,
            event_id: Some(event_id.into()),
            payload,
        }
    }

    /// Event with neither key nor id; deduplication falls back to a
    /// content hash of the payload.
    #[must_use]
    pub fn bare(payload: serde_json::Value) -> Self {
        Self {
            idempotency_key: None,
            event_id: None,
            payload,
        }
    }
}

/// Filter narrowing a delta sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFilter {
    /// Lower bound for the delta window, overriding the stored
    /// checkpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_after: Option<DateTime<Utc>>,
}

/// A request to synchronize one tenant's catalog with one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncJob {
    /// Caller-assigned id, used for correlation and logging.
    pub sync_id: Uuid,
    /// Tenant whose catalog is being synchronized.
    pub tenant_id: Uuid,
    /// Platform to synchronize with.
    pub source: ProductSource,
    /// Traversal mode.
    pub mode: SyncMode,
    /// Conflict resolution policy.
    pub policy: ConflictPolicy,
    /// Webhook event, required for [`SyncMode::Webhook`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookEvent>,
    /// Delta filter, optional for [`SyncMode::Delta`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<SyncFilter>,
}

impl SyncJob {
    /// Create a webhook job.
    #[must_use]
    pub fn webhook(
        tenant_id: Uuid,
        source: ProductSource,
        policy: ConflictPolicy,
        event: WebhookEvent,
    ) -> Self {
        Self {
            sync_id: Uuid::new_v4(),
            tenant_id,
            source,
            mode: SyncMode::Webhook,
            policy,
            webhook: Some(event),
            filter: None,
        }
    }

    /// Create a delta job.
    #[must_use]
    pub fn delta(tenant_id: Uuid, source: ProductSource, policy: ConflictPolicy) -> Self {
        Self {
            sync_id: Uuid::new_v4(),
            tenant_id,
            source,
            mode: SyncMode::Delta,
            policy,
            webhook: None,
            filter: None,
        }
    }

    /// Create a full re-sync job.
    #[must_use]
    pub fn full(tenant_id: Uuid, source: ProductSource, policy: ConflictPolicy) -> Self {
        Self {
            mode: SyncMode::Full,
            ..Self::delta(tenant_id, source, policy)
        }
    }

    /// Create an inventory-only job.
    #[must_use]
    pub fn inventory(tenant_id: Uuid, source: ProductSource) -> Self {
        Self {
            mode: SyncMode::Inventory,
            ..Self::delta(tenant_id, source, ConflictPolicy::SourceWins)
        }
    }

    /// Override the auto-generated sync id.
    #[must_use]
    pub fn with_sync_id(mut self, sync_id: Uuid) -> Self {
        self.sync_id = sync_id;
        self
    }

    /// Bound a delta job below by an explicit timestamp.
    #[must_use]
    pub fn with_updated_after(mut self, updated_after: DateTime<Utc>) -> Self {
        self.filter = Some(SyncFilter {
            updated_after: Some(updated_after),
        });
        self
    }

    /// Check structural validity. Called by the orchestrator before any
    /// side effect.
    pub fn validate(&self) -> SyncResult<()> {
        if self.mode == SyncMode::Webhook && self.webhook.is_none() {
            return Err(SyncError::validation(
                "webhook mode requires webhook data",
            ));
        }
        Ok(())
    }
}

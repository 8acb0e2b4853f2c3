//! # Merx Sync
//!
//! Product synchronization engine. Accepts sync jobs (webhook-triggered,
//! scheduled delta, full re-sync, inventory-only), decides per item
//! whether to create, update, or skip a local record, detects conflicting
//! concurrent updates, and guarantees at-most-once application of any
//! webhook event even under queue redelivery.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐      ┌──────────────────┐
//! │ Scheduler /    │─────►│  Orchestrator    │
//! │ Webhook intake │ job  │                  │
//! └────────────────┘      └────────┬─────────┘
//!                                  │
//!            ┌─────────────────────┼──────────────────────┐
//!            ▼                     ▼                      ▼
//!   ┌─────────────────┐   ┌───────────────┐      ┌───────────────┐
//!   │ Idempotency     │   │  Lock Guard   │      │  Normalizer   │
//!   │ Guard (webhook) │   │ (bulk modes)  │      │ (merx-connector)
//!   └─────────────────┘   └───────────────┘      └───────┬───────┘
//!                                                        │
//!                              ┌───────────────┐         ▼
//!                              │   Conflict    │◄── ┌───────────────┐
//!                              │   Resolver    │    │  Item Syncer  │
//!                              └───────────────┘    └───────┬───────┘
//!                                                          │
//!                                                   ┌──────▼────────┐
//!                                                   │  Catalog      │
//!                                                   │  Repository   │
//!                                                   └───────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Idempotency**: webhook events deduplicate on an explicit key, the
//!   platform event id, or a content hash; redeliveries short-circuit to
//!   a benign skip, and an aborted first attempt releases the key so a
//!   retry is not permanently blocked.
//! - **Mutual exclusion**: at most one bulk job per `(tenant, source)`;
//!   a concurrent attempt is rejected immediately with a zero-work
//!   report, never queued.
//! - **Partial-failure isolation**: each item applies independently; one
//!   bad item never aborts a batch, and the delta checkpoint advances
//!   even after a partial run.
//!
//! The relational repository, the TTL-keyed idempotency/lock stores, the
//! cache transport, and the queue transport are ports ([`catalog`],
//! [`idempotency`], [`lock`], [`cache`], [`queue`], [`config`]); the
//! [`memory`] module provides process-local stand-ins for local testing.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod conflict;
pub mod error;
pub mod idempotency;
pub mod item;
pub mod job;
pub mod lock;
pub mod memory;
pub mod orchestrator;
pub mod queue;
pub mod report;
pub mod scheduler;
pub mod stats;

// Re-exports for convenience
pub use cache::ProductCache;
pub use catalog::{CatalogRepository, NewProduct, ProductPatch, ProductRecord};
pub use config::{SyncConfigStore, SyncSourceConfig};
pub use conflict::{FieldConflict, ProductConflict};
pub use error::{SyncError, SyncResult};
pub use idempotency::{AcquireOutcome, IdempotencyRecord, IdempotencyStore};
pub use item::{ItemOutcome, ItemSyncer, SyncAction};
pub use job::{ConflictPolicy, SyncFilter, SyncJob, SyncMode, WebhookEvent};
pub use lock::{LockAttempt, LockService};
pub use orchestrator::{SyncOptions, SyncOrchestrator};
pub use queue::JobQueue;
pub use report::{ItemError, SyncReport, SyncStatus};
pub use scheduler::{SchedulerConfig, SyncScheduler};
pub use stats::SyncStats;

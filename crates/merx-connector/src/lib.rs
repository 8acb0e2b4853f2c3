//! # Merx Connector
//!
//! Canonical product model and platform-facing ports for the Merx
//! catalog synchronization engine.
//!
//! This crate owns the seam between heterogeneous commerce platforms and
//! the rest of the system:
//!
//! - [`ProductSource`] — the supported platforms, with unrecognized names
//!   degrading to [`ProductSource::Custom`].
//! - [`NormalizedProduct`] — the one canonical shape every payload is
//!   mapped into before the sync engine sees it.
//! - [`normalize`] — tagged-variant dispatch to one parser per platform
//!   plus a generic best-effort fallback.
//! - [`SourceClient`] — the outbound port for fetching catalogs and
//!   inventory; HTTP implementations live with the platform integrations.
//!
//! ```text
//! ┌──────────────┐   raw payload   ┌────────────┐   canonical   ┌─────────────┐
//! │  Platform    │────────────────►│ Normalizer │──────────────►│ Sync Engine │
//! │ (webhook/API)│                 │ (per source)│              │ (merx-sync) │
//! └──────────────┘                 └────────────┘               └─────────────┘
//! ```

pub mod client;
pub mod error;
pub mod normalize;
pub mod product;
pub mod source;

pub use client::{ProductFilter, SourceClient};
pub use error::{ConnectorError, ConnectorResult};
pub use normalize::normalize;
pub use product::{InventoryLevel, NormalizedProduct, ProductStatus, ProductVariant};
pub use source::ProductSource;

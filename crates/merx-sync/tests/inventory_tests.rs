//! Inventory-only sync behavior.

mod common;

use chrono::Utc;
use common::{normalized, Harness, ScriptedSource, TENANT_A};
use merx_connector::{InventoryLevel, ProductSource};
use merx_sync::{CatalogRepository, ConflictPolicy, SyncJob, SyncStatus};
use pretty_assertions::assert_eq;

fn level(external_id: &str, sku: Option<&str>, quantity: i64) -> InventoryLevel {
    InventoryLevel {
        external_id: external_id.into(),
        sku: sku.map(Into::into),
        quantity,
    }
}

/// Harness whose catalog is seeded with one product and whose source
/// serves the given inventory rows.
async fn seeded_harness(levels: Vec<InventoryLevel>) -> Harness {
    let source = ScriptedSource::with_products(vec![normalized(
        "555",
        Some("MUG-RED"),
        9.99,
        Some(42),
        Utc::now(),
    )]);
    let harness = Harness::new(source);

    let seed = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::SourceWins);
    harness.orchestrator.run(&seed).await.unwrap();

    harness.source.set_inventory(levels);
    harness
}

#[tokio::test]
async fn inventory_sync_changes_only_stock() {
    let harness = seeded_harness(vec![level("555", Some("MUG-RED"), 7)]).await;

    let before = harness
        .repository
        .find_by_external_id_or_sku(TENANT_A, "555", None)
        .await
        .unwrap()
        .unwrap();

    let job = SyncJob::inventory(TENANT_A, ProductSource::Shopify);
    let report = harness.orchestrator.run(&job).await.unwrap();

    assert!(report.success);
    assert_eq!(report.stats.inventory_updates, 1);
    assert_eq!(report.stats.updated, 1);

    let after = harness
        .repository
        .find_by_external_id_or_sku(TENANT_A, "555", None)
        .await
        .unwrap()
        .unwrap();

    // Only stock moved.
    assert_eq!(after.stock, 7);
    assert_eq!(after.name, before.name);
    assert_eq!(after.price, before.price);
    assert_eq!(after.description, before.description);
    assert_eq!(after.status, before.status);
}

#[tokio::test]
async fn inventory_rows_without_local_product_are_skipped() {
    let harness = seeded_harness(vec![
        level("555", Some("MUG-RED"), 7),
        level("999", Some("GHOST"), 3),
    ])
    .await;

    let job = SyncJob::inventory(TENANT_A, ProductSource::Shopify);
    let report = harness.orchestrator.run(&job).await.unwrap();

    assert!(report.success);
    assert_eq!(report.stats.inventory_updates, 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.errors, 0);
}

#[tokio::test]
async fn inventory_failures_are_counted_independently() {
    let harness = seeded_harness(vec![level("555", Some("MUG-RED"), 7)]).await;
    harness.flaky.fail_writes_for("555");

    let job = SyncJob::inventory(TENANT_A, ProductSource::Shopify);
    let report = harness.orchestrator.run(&job).await.unwrap();

    assert!(!report.success);
    assert_eq!(report.status, SyncStatus::Partial);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.inventory_updates, 0);
}

#[tokio::test]
async fn inventory_sync_invalidates_only_inventory_cache() {
    let harness = seeded_harness(vec![level("555", Some("MUG-RED"), 7)]).await;

    let job = SyncJob::inventory(TENANT_A, ProductSource::Shopify);
    harness.orchestrator.run(&job).await.unwrap();

    let invalidated = harness.cache.invalidated();
    // First entry is the seeding delta's product invalidation; the
    // inventory run touched only inventory keys.
    assert_eq!(
        invalidated,
        vec![
            format!("products:{TENANT_A}"),
            format!("inventory:{TENANT_A}"),
        ]
    );
}

#[tokio::test]
async fn inventory_matches_by_sku_when_external_id_unknown() {
    let harness = seeded_harness(vec![level("different-id", Some("MUG-RED"), 11)]).await;

    let job = SyncJob::inventory(TENANT_A, ProductSource::Shopify);
    let report = harness.orchestrator.run(&job).await.unwrap();

    assert_eq!(report.stats.inventory_updates, 1);
    let record = harness
        .repository
        .find_by_external_id_or_sku(TENANT_A, "555", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.stock, 11);
}

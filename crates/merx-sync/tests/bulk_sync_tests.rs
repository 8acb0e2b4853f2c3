//! Delta and full sync behavior: failure isolation, checkpoint
//! advancement, window resolution, cache invalidation.

mod common;

use chrono::{Duration, Utc};
use common::{normalized, Harness, ScriptedSource, TENANT_A};
use merx_connector::ProductSource;
use merx_sync::{ConflictPolicy, SyncConfigStore, SyncJob, SyncStatus};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn one_bad_item_does_not_abort_the_batch() {
    let now = Utc::now();
    let harness = Harness::new(ScriptedSource::with_products(vec![
        normalized("1", Some("SKU-1"), 10.0, Some(1), now),
        normalized("2", Some("SKU-2"), 20.0, Some(2), now),
        normalized("3", Some("SKU-3"), 30.0, Some(3), now),
    ]));
    harness.flaky.fail_writes_for("2");

    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    let report = harness.orchestrator.run(&job).await.unwrap();

    // Items 1 and 3 applied; item 2 collected as an error.
    assert_eq!(report.stats.created, 2);
    assert_eq!(report.stats.errors, 1);
    assert!(!report.success);
    assert_eq!(report.status, SyncStatus::Partial);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].external_id, "2");
    assert_eq!(report.errors[0].code, "REPOSITORY_ERROR");
    assert!(report.errors[0].retryable);
    assert_eq!(harness.repository.len(), 2);
}

#[tokio::test]
async fn checkpoint_advances_even_after_partial_run() {
    let now = Utc::now();
    let harness = Harness::new(ScriptedSource::with_products(vec![
        normalized("1", None, 1.0, None, now),
        normalized("2", None, 2.0, None, now),
        normalized("3", None, 3.0, None, now),
        normalized("4", None, 4.0, None, now),
        normalized("5", None, 5.0, None, now),
    ]));
    harness.flaky.fail_writes_for("2");
    harness.flaky.fail_writes_for("4");

    let before = Utc::now();
    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    let report = harness.orchestrator.run(&job).await.unwrap();

    assert_eq!(report.stats.errors, 2);
    assert_eq!(report.status, SyncStatus::Partial);

    // The stored checkpoint still advanced to "now", so the next delta
    // does not replay the same window.
    let checkpoint = harness
        .configs
        .last_sync_at(TENANT_A, ProductSource::Shopify)
        .await
        .unwrap()
        .expect("checkpoint stored");
    assert!(checkpoint >= before);
}

#[tokio::test]
async fn delta_uses_explicit_filter_over_checkpoint() {
    let harness = Harness::new(ScriptedSource::new());
    let stored = Utc::now() - Duration::days(3);
    harness
        .configs
        .set_last_sync_at(TENANT_A, ProductSource::Shopify, stored)
        .await
        .unwrap();

    let explicit = Utc::now() - Duration::hours(1);
    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins)
        .with_updated_after(explicit);
    harness.orchestrator.run(&job).await.unwrap();

    let filters = harness.source.seen_filters();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].updated_after, Some(explicit));
}

#[tokio::test]
async fn delta_falls_back_to_stored_checkpoint() {
    let harness = Harness::new(ScriptedSource::new());
    let stored = Utc::now() - Duration::days(3);
    harness
        .configs
        .set_last_sync_at(TENANT_A, ProductSource::Shopify, stored)
        .await
        .unwrap();

    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    harness.orchestrator.run(&job).await.unwrap();

    let filters = harness.source.seen_filters();
    assert_eq!(filters[0].updated_after, Some(stored));
}

#[tokio::test]
async fn full_sync_ignores_checkpoint() {
    let harness = Harness::new(ScriptedSource::new());
    harness
        .configs
        .set_last_sync_at(TENANT_A, ProductSource::Shopify, Utc::now())
        .await
        .unwrap();

    let job = SyncJob::full(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    harness.orchestrator.run(&job).await.unwrap();

    let filters = harness.source.seen_filters();
    assert_eq!(filters[0].updated_after, None);
}

#[tokio::test]
async fn bulk_run_invalidates_product_cache_even_when_partial() {
    let now = Utc::now();
    let harness = Harness::new(ScriptedSource::with_products(vec![
        normalized("1", None, 1.0, None, now),
        normalized("2", None, 2.0, None, now),
    ]));
    harness.flaky.fail_writes_for("2");

    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    let report = harness.orchestrator.run(&job).await.unwrap();
    assert_eq!(report.status, SyncStatus::Partial);

    // Even a partial sync changed visible state.
    let invalidated = harness.cache.invalidated();
    assert_eq!(invalidated, vec![format!("products:{TENANT_A}")]);
}

#[tokio::test]
async fn bulk_report_recommends_next_sync() {
    let harness = Harness::new(ScriptedSource::new());

    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    let report = harness.orchestrator.run(&job).await.unwrap();

    let next = report.next_sync_recommended.expect("recommended");
    assert!(next > report.last_sync_at + Duration::hours(5));
}

#[tokio::test]
async fn repeated_delta_updates_instead_of_duplicating() {
    let now = Utc::now();
    let harness = Harness::new(ScriptedSource::with_products(vec![normalized(
        "1",
        Some("SKU-1"),
        10.0,
        Some(5),
        now,
    )]));

    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    let first = harness.orchestrator.run(&job).await.unwrap();
    assert_eq!(first.stats.created, 1);

    let job = SyncJob::delta(TENANT_A, ProductSource::Shopify, ConflictPolicy::NewestWins);
    let second = harness.orchestrator.run(&job).await.unwrap();
    assert_eq!(second.stats.created, 0);
    assert_eq!(second.stats.updated, 1);
    assert_eq!(harness.repository.len(), 1);
}

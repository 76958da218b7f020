//! Storage idempotence and batch atomicity

use crate::common::{bg_ro_pair, fixture_window, hourly_records};
use entsoe_flows::storage::{FlowStore, SqliteFlowStore};
use entsoe_flows::Zone;

#[tokio::test]
async fn test_full_rerun_leaves_identical_state() {
    let store = SqliteFlowStore::open_in_memory().await.unwrap();
    let batch = hourly_records(&bg_ro_pair(), &fixture_window());

    store.upsert_batch(&batch).await.unwrap();
    let first = store.all_records().await.unwrap();

    // Second run over the identical window: same rows, same values
    store.upsert_batch(&batch).await.unwrap();
    let second = store.all_records().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.len(), 24);
}

#[tokio::test]
async fn test_overlapping_windows_never_duplicate() {
    let store = SqliteFlowStore::open_in_memory().await.unwrap();
    let pair = bg_ro_pair();
    let window = fixture_window();
    let batch = hourly_records(&pair, &window);

    store.upsert_batch(&batch).await.unwrap();
    // Overlap: re-send the last 12 hours with updated values
    let mut overlap: Vec<_> = batch[12..].to_vec();
    for record in &mut overlap {
        record.quantity_mw += 1000.0;
    }
    store.upsert_batch(&overlap).await.unwrap();

    let records = store.all_records().await.unwrap();
    assert_eq!(records.len(), 24, "overlap duplicated rows");
    let updated = records
        .iter()
        .filter(|r| r.quantity_mw >= 1000.0)
        .count();
    assert_eq!(updated, 12);
}

#[tokio::test]
async fn test_reverse_direction_is_a_distinct_key() {
    let store = SqliteFlowStore::open_in_memory().await.unwrap();
    let window = fixture_window();
    let forward = hourly_records(&bg_ro_pair(), &window);
    let backward = hourly_records(&bg_ro_pair().reversed(), &window);

    store.upsert_batch(&forward).await.unwrap();
    store.upsert_batch(&backward).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 48);
}

#[tokio::test]
async fn test_constraint_violation_mid_batch_commits_nothing() {
    let store = SqliteFlowStore::open_in_memory().await.unwrap();
    let mut batch = hourly_records(&bg_ro_pair(), &fixture_window());
    batch.truncate(10);
    batch[6].in_zone = Zone::from("");

    assert!(store.upsert_batch(&batch).await.is_err());
    assert_eq!(store.count().await.unwrap(), 0, "partial batch was committed");
}

#[tokio::test]
async fn test_database_file_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flows.sqlite");
    let path = path.to_string_lossy();

    {
        let store = SqliteFlowStore::open(&path).await.unwrap();
        store
            .upsert_batch(&hourly_records(&bg_ro_pair(), &fixture_window()))
            .await
            .unwrap();
    }

    let reopened = SqliteFlowStore::open(&path).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 24);
}

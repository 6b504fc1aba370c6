//! Integration tests applying the embedded Cacophony catalog to DuckDB.

use cacophony_db::{DuckDbStore, Store};
use cacophony_migrate::catalog::{self, MIGRATIONS};
use cacophony_migrate::{MigrateError, Runner};
use std::sync::Arc;

fn catalog_runner(store: &Arc<dyn Store>) -> Runner {
    Runner::new(Arc::clone(store), catalog::registry().unwrap())
}

async fn column_names(store: &Arc<dyn Store>, table: &str) -> Vec<String> {
    store
        .query_rows(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
            &[table],
        )
        .await
        .unwrap()
        .into_iter()
        .filter_map(|row| row.into_iter().next().flatten())
        .collect()
}

async fn count(store: &Arc<dyn Store>, sql: &str) -> i64 {
    store.query_rows(sql, &[]).await.unwrap()[0][0]
        .as_deref()
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_full_catalog_applies_to_empty_database() {
    let store: Arc<dyn Store> = Arc::new(DuckDbStore::in_memory().unwrap());
    let runner = catalog_runner(&store);

    let report = runner.apply_pending(None).await.unwrap();
    assert!(report.is_success(), "failure: {:?}", report.failure);
    assert_eq!(report.completed.len(), MIGRATIONS.len());

    for table in [
        "device_groups",
        "devices",
        "recordings",
        "tracks",
        "track_tags",
        "stations",
        "alerts",
    ] {
        assert!(store.relation_exists(table).await.unwrap(), "{table} missing");
    }

    let device_columns = column_names(&store, "devices").await;
    assert!(device_columns.contains(&"last_connection_time".to_string()));
    assert!(device_columns.contains(&"next_heartbeat".to_string()));
    assert!(column_names(&store, "recordings")
        .await
        .contains(&"station_id".to_string()));

    let status = runner.status().await.unwrap();
    assert!(status.is_up_to_date());
    assert_eq!(status.applied.len(), MIGRATIONS.len());
}

#[tokio::test]
async fn test_full_catalog_reverts_to_empty_schema() {
    let store: Arc<dyn Store> = Arc::new(DuckDbStore::in_memory().unwrap());
    let runner = catalog_runner(&store);
    runner.apply_pending(None).await.unwrap();

    let report = runner.revert(MIGRATIONS.len()).await.unwrap();
    assert!(report.is_success(), "failure: {:?}", report.failure);
    assert_eq!(report.completed.len(), MIGRATIONS.len());
    assert_eq!(
        report.completed.first().unwrap().as_str(),
        MIGRATIONS.last().unwrap().id
    );

    for table in ["device_groups", "devices", "recordings", "track_tags", "alerts"] {
        assert!(!store.relation_exists(table).await.unwrap(), "{table} left behind");
    }
    assert!(runner.ledger().applied_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_heartbeat_round_trip_restores_device_columns() {
    let store: Arc<dyn Store> = Arc::new(DuckDbStore::in_memory().unwrap());
    let runner = catalog_runner(&store);
    runner
        .apply_pending(Some("20210817000000-create-alerts"))
        .await
        .unwrap();
    let before = column_names(&store, "devices").await;

    runner
        .apply_pending(Some("20230615021417-add-device-heartbeat"))
        .await
        .unwrap();
    runner.revert(1).await.unwrap();

    assert_eq!(column_names(&store, "devices").await, before);
    assert!(!runner
        .ledger()
        .is_applied("20230615021417-add-device-heartbeat")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_tag_backfill_rewrites_human_tags_only() {
    let store: Arc<dyn Store> = Arc::new(DuckDbStore::in_memory().unwrap());
    let runner = catalog_runner(&store);
    runner
        .apply_pending(Some("20230615021417-add-device-heartbeat"))
        .await
        .unwrap();

    store
        .execute_batch(
            "INSERT INTO track_tags (id, track_id, what, confidence, automatic) VALUES
                 (1, 10, 'unknown', NULL, false),
                 (2, 10, 'unknown', 0.4, true),
                 (3, 11, 'possum', 0.9, true);",
        )
        .await
        .unwrap();

    runner.apply_pending(None).await.unwrap();

    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM track_tags WHERE what = 'unidentified'").await,
        1
    );
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM track_tags WHERE model = 'master'").await,
        2
    );

    // Reverting past the backfill removes its ledger row but keeps the data.
    runner.revert(3).await.unwrap();
    assert!(!runner
        .ledger()
        .is_applied("20231030000000-rename-unknown-tags")
        .await
        .unwrap());
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM track_tags WHERE what = 'unidentified'").await,
        1
    );
}

#[tokio::test]
async fn test_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cacophony.duckdb");
    {
        let store: Arc<dyn Store> = Arc::new(DuckDbStore::from_path(&path).unwrap());
        catalog_runner(&store)
            .apply_pending(Some("20190604000000-create-recordings"))
            .await
            .unwrap();
    }

    let store: Arc<dyn Store> = Arc::new(DuckDbStore::from_path(&path).unwrap());
    let runner = catalog_runner(&store);
    let plan = runner.plan_pending(None).await.unwrap();
    assert_eq!(plan.len(), MIGRATIONS.len() - 3);
    assert_eq!(plan[0].as_str(), "20190604000100-create-tracks-and-tags");
}

#[tokio::test]
async fn test_target_must_be_registered() {
    let store: Arc<dyn Store> = Arc::new(DuckDbStore::in_memory().unwrap());
    let err = catalog_runner(&store)
        .apply_pending(Some("20230615021417-add-heartbeat"))
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::UnknownTarget { .. }));
}

#[tokio::test]
async fn test_status_serializes_for_json_output() {
    let store: Arc<dyn Store> = Arc::new(DuckDbStore::in_memory().unwrap());
    let runner = catalog_runner(&store);
    runner
        .apply_pending(Some("20231030000000-rename-unknown-tags"))
        .await
        .unwrap();

    let json = serde_json::to_value(runner.status().await.unwrap()).unwrap();
    let applied = json["applied"].as_array().unwrap();
    let last = applied.last().unwrap();
    assert_eq!(last["id"], "20231030000000-rename-unknown-tags");
    assert_eq!(last["reversibility"], "irreversible");
    assert_eq!(applied[0]["reversibility"], "reversible");
    assert_eq!(json["pending"].as_array().unwrap().len(), 2);
    assert!(json["orphaned"].as_array().unwrap().is_empty());
    assert!(json["lock"].is_null());
}

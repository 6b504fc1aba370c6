use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbStore::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
    assert!(db.supports_transactional_ddl());
}

#[tokio::test]
async fn test_new_memory_special_case() {
    let db = DuckDbStore::new(":memory:").unwrap();
    db.execute_batch("CREATE TABLE t (id INT)").await.unwrap();
    assert!(db.relation_exists("t").await.unwrap());
}

#[tokio::test]
async fn test_from_path_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.duckdb");
    {
        let db = DuckDbStore::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE devices (id INT)").await.unwrap();
    }
    let db = DuckDbStore::from_path(&path).unwrap();
    assert!(db.relation_exists("devices").await.unwrap());
}

#[tokio::test]
async fn test_open_read_only_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typo.duckdb");

    let err = DuckDbStore::open_read_only(&path).err().unwrap();
    assert!(matches!(err, DbError::ConnectionError(_)), "got {err}");
    assert!(!path.exists());
}

#[tokio::test]
async fn test_open_read_only_reads_but_refuses_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.duckdb");
    {
        let db = DuckDbStore::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE devices (id INT)").await.unwrap();
    }

    let db = DuckDbStore::open_read_only(&path).unwrap();
    assert!(db.relation_exists("devices").await.unwrap());
    assert!(db.execute_batch("CREATE TABLE other (id INT)").await.is_err());
}

#[tokio::test]
async fn test_execute_with_params() {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch("CREATE TABLE tags (what VARCHAR)")
        .await
        .unwrap();

    let inserted = db
        .execute("INSERT INTO tags VALUES (?), (?)", &["possum", "rat"])
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let rows = db
        .query_rows("SELECT what FROM tags WHERE what = ?", &["rat"])
        .await
        .unwrap();
    assert_eq!(rows, vec![vec![Some("rat".to_string())]]);
}

#[tokio::test]
async fn test_query_rows_coerces_types() {
    let db = DuckDbStore::in_memory().unwrap();
    let rows = db
        .query_rows("SELECT 'a', 42::BIGINT, NULL", &[])
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![vec![
            Some("a".to_string()),
            Some("42".to_string()),
            None,
        ]]
    );
}

#[tokio::test]
async fn test_execute_batch() {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE t1 (id INT); CREATE TABLE t2 (id INT); INSERT INTO t1 VALUES (1);",
    )
    .await
    .unwrap();

    assert!(db.relation_exists("t1").await.unwrap());
    assert!(db.relation_exists("t2").await.unwrap());
}

#[tokio::test]
async fn test_relation_not_exists() {
    let db = DuckDbStore::in_memory().unwrap();
    assert!(!db.relation_exists("nonexistent").await.unwrap());
}

#[tokio::test]
async fn test_relation_exists_schema_qualified() {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch("CREATE SCHEMA audit; CREATE TABLE audit.events (id INT)")
        .await
        .unwrap();
    assert!(db.relation_exists("audit.events").await.unwrap());
    assert!(!db.relation_exists("events").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_key_is_constraint_violation() {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch("CREATE TABLE ledger (id VARCHAR PRIMARY KEY)")
        .await
        .unwrap();
    db.execute("INSERT INTO ledger VALUES (?)", &["20230101-a"])
        .await
        .unwrap();

    let err = db
        .execute("INSERT INTO ledger VALUES (?)", &["20230101-a"])
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_missing_table_classified() {
    let db = DuckDbStore::in_memory().unwrap();
    let err = db.execute("DELETE FROM missing", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)), "got {err}");
}

#[tokio::test]
async fn test_existing_table_is_not_table_not_found() {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
    let err = db.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap_err();
    assert!(matches!(err, DbError::ExecutionError(_)), "got {err}");
}

#[tokio::test]
async fn test_rollback_discards_ddl() {
    let db = DuckDbStore::in_memory().unwrap();
    db.begin().await.unwrap();
    db.execute_batch("CREATE TABLE scratch (id INT)")
        .await
        .unwrap();
    db.rollback().await.unwrap();

    assert!(!db.relation_exists("scratch").await.unwrap());
}

#[tokio::test]
async fn test_commit_keeps_ddl() {
    let db = DuckDbStore::in_memory().unwrap();
    db.begin().await.unwrap();
    db.execute_batch("CREATE TABLE kept (id INT)").await.unwrap();
    db.commit().await.unwrap();

    assert!(db.relation_exists("kept").await.unwrap());
}

#[tokio::test]
async fn test_commit_without_begin_fails() {
    let db = DuckDbStore::in_memory().unwrap();
    let err = db.commit().await.unwrap_err();
    assert!(matches!(err, DbError::TransactionError(_)));
}

#[tokio::test]
async fn test_without_transactional_ddl() {
    let db = DuckDbStore::in_memory()
        .unwrap()
        .without_transactional_ddl();
    assert!(!db.supports_transactional_ddl());
}

use super::*;
use cacophony_db::DuckDbStore;

fn lock() -> MigrationLock {
    let store: Arc<dyn Store> = Arc::new(DuckDbStore::in_memory().unwrap());
    MigrationLock::new(store, "schema_migrations_lock")
}

#[test]
fn test_holder_id_is_unique_per_call() {
    let a = MigrationLock::holder_id("cacophony");
    let b = MigrationLock::holder_id("cacophony");
    assert!(a.starts_with("cacophony:"));
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_acquire_and_release() {
    let lock = lock();
    assert_eq!(lock.current().await.unwrap(), None);

    lock.acquire("deploy-a").await.unwrap();
    assert_eq!(lock.current().await.unwrap().unwrap().holder, "deploy-a");

    assert!(lock.release("deploy-a").await.unwrap());
    assert_eq!(lock.current().await.unwrap(), None);
}

#[tokio::test]
async fn test_second_acquire_reports_holder() {
    let lock = lock();
    lock.acquire("deploy-a").await.unwrap();

    let err = lock.acquire("deploy-b").await.unwrap_err();
    match err {
        MigrateError::LockHeld { holder, .. } => assert_eq!(holder, "deploy-a"),
        other => panic!("expected LockHeld, got {other}"),
    }
}

#[tokio::test]
async fn test_release_by_other_holder_keeps_lock() {
    let lock = lock();
    lock.acquire("deploy-a").await.unwrap();

    assert!(!lock.release("deploy-b").await.unwrap());
    assert!(lock.current().await.unwrap().is_some());
}

#[tokio::test]
async fn test_force_release() {
    let lock = lock();
    assert_eq!(lock.force_release().await.unwrap(), None);

    lock.acquire("crashed-deploy").await.unwrap();
    let previous = lock.force_release().await.unwrap().unwrap();
    assert_eq!(previous.holder, "crashed-deploy");

    lock.acquire("next-deploy").await.unwrap();
}

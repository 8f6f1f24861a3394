use gdelt_store::db::{DbActorHandle, DbSettings};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

async fn fresh_store(tag: &str) -> (DbActorHandle, PathBuf) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut db_path = std::env::temp_dir();
    db_path.push(format!(
        "gdelt-store-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    let database_url = format!("sqlite:{}", db_path.display());
    let handle = gdelt_store::db::spawn(DbSettings::new(database_url))
        .await
        .expect("failed to spawn DbActor");
    (handle, db_path)
}

async fn cleanup(db_path: PathBuf) {
    let wal = PathBuf::from(format!("{}-wal", db_path.display()));
    let shm = PathBuf::from(format!("{}-shm", db_path.display()));
    let _ = fs::remove_file(&wal).await;
    let _ = fs::remove_file(&shm).await;
    let _ = fs::remove_file(&db_path).await;
}

#[tokio::test]
async fn register_poll_mark_roundtrip() {
    let (store, db_path) = fresh_store("queue-roundtrip").await;

    store
        .register("export", 1000, "http://x")
        .await
        .expect("register failed");

    let pending = store
        .poll_unfetched("export", Some(0), Some(2000))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].resource_type, "export");
    assert_eq!(pending[0].tms, 1000);
    assert_eq!(pending[0].url, "http://x");
    assert!(!pending[0].fetched);

    store.mark_fetched("export", 1000).await.unwrap();

    let pending = store
        .poll_unfetched("export", Some(0), Some(2000))
        .await
        .unwrap();
    assert!(pending.is_empty(), "fetched entry still pending");

    cleanup(db_path).await;
}

#[tokio::test]
async fn poll_window_is_half_open_and_skips_fetched() {
    let (store, db_path) = fresh_store("queue-window").await;

    for tms in [50, 100, 150, 199, 200, 250] {
        store
            .register("export", tms, &format!("http://feed/{tms}"))
            .await
            .unwrap();
    }
    store.mark_fetched("export", 150).await.unwrap();

    let mut pending: Vec<i64> = store
        .poll_unfetched("export", Some(100), Some(200))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.tms)
        .collect();
    pending.sort_unstable();

    // 100 <= tms < 200, unfetched only: 150 is fetched, 200 out of range.
    assert_eq!(pending, vec![100, 199]);

    cleanup(db_path).await;
}

#[tokio::test]
async fn poll_defaults_span_zero_to_now() {
    let (store, db_path) = fresh_store("queue-defaults").await;

    store.register("export", 1000, "http://a").await.unwrap();

    let pending = store.poll_unfetched("export", None, None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].tms, 1000);

    cleanup(db_path).await;
}

#[tokio::test]
async fn reregister_keeps_stored_url() {
    let (store, db_path) = fresh_store("queue-reregister-url").await;

    store.register("export", 500, "http://original").await.unwrap();
    store.register("export", 500, "http://changed").await.unwrap();

    let pending = store
        .poll_unfetched("export", Some(0), Some(1000))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, "http://original");

    cleanup(db_path).await;
}

#[tokio::test]
async fn reregister_never_revives_a_fetched_entry() {
    let (store, db_path) = fresh_store("queue-monotonic").await;

    store.register("export", 1000, "http://x").await.unwrap();
    store.mark_fetched("export", 1000).await.unwrap();

    // Discovery may run again and re-announce the same resource.
    store.register("export", 1000, "http://x").await.unwrap();

    let pending = store
        .poll_unfetched("export", Some(0), Some(2000))
        .await
        .unwrap();
    assert!(
        pending.is_empty(),
        "re-registration regressed a fetched entry to pending"
    );

    cleanup(db_path).await;
}

#[tokio::test]
async fn mark_fetched_on_missing_entry_is_a_noop() {
    let (store, db_path) = fresh_store("queue-mark-missing").await;

    store
        .mark_fetched("export", 12345)
        .await
        .expect("mark_fetched on a missing entry must not error");

    cleanup(db_path).await;
}

#[tokio::test]
async fn resource_types_are_independent_queues() {
    let (store, db_path) = fresh_store("queue-types").await;

    store.register("export", 1000, "http://e").await.unwrap();
    store.register("mentions", 1000, "http://m").await.unwrap();

    let exports = store
        .poll_unfetched("export", Some(0), Some(2000))
        .await
        .unwrap();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].url, "http://e");

    store.mark_fetched("export", 1000).await.unwrap();

    // Marking one type leaves the other untouched.
    let mentions = store
        .poll_unfetched("mentions", Some(0), Some(2000))
        .await
        .unwrap();
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].url, "http://m");

    cleanup(db_path).await;
}

#[tokio::test]
async fn register_rejects_blank_url() {
    let (store, db_path) = fresh_store("queue-blank-url").await;

    let err = store.register("export", 1000, "  ").await.unwrap_err();
    assert!(matches!(err, gdelt_store::StoreError::Validation(_)));

    cleanup(db_path).await;
}

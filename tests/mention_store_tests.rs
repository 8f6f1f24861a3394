use gdelt_store::db::{DbActorHandle, DbSettings, EventFact, InsertOutcome, MentionFact};
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

fn event(id: i64, tms: i64) -> EventFact {
    EventFact {
        id,
        actor_name: Some("FRANCE".to_string()),
        event_code: Some("043".to_string()),
        lat: None,
        long: None,
        goldstein: 3,
        num_mentions: 1,
        tms,
        source_url: format!("http://news.example/{id}"),
    }
}

fn mention(event: i64, tms: i64, name: &str) -> MentionFact {
    MentionFact {
        event,
        tms,
        name: name.to_string(),
        confidence: 50,
        tone: -1.5,
    }
}

#[tokio::test]
async fn duplicate_triple_is_reported_not_fatal() {
    let (store, db_path) = fresh_store("mentions-duplicate").await;

    store.insert_event(event(1, 100)).await.unwrap();

    let outcome = store
        .insert_mention(mention(1, 100, "Alice"))
        .await
        .unwrap();
    assert_eq!(outcome, InsertOutcome::Inserted);

    // Two fetch jobs racing on the same mention: the loser must see
    // "already present", never an error.
    let outcome = store
        .insert_mention(mention(1, 100, "Alice"))
        .await
        .unwrap();
    assert_eq!(outcome, InsertOutcome::AlreadyPresent);

    let summary = store.window_summary(0, 1000, 0, 100).await.unwrap();
    assert_eq!(summary.list.len(), 1, "duplicate triple left extra rows");

    cleanup(db_path).await;
}

#[tokio::test]
async fn same_name_at_other_instants_is_distinct() {
    let (store, db_path) = fresh_store("mentions-distinct").await;

    store.insert_event(event(1, 100)).await.unwrap();
    store.insert_event(event(2, 100)).await.unwrap();

    // Differ in tms or event: all three are distinct mentions.
    for m in [
        mention(1, 100, "Alice"),
        mention(1, 101, "Alice"),
        mention(2, 100, "Alice"),
    ] {
        assert_eq!(
            store.insert_mention(m).await.unwrap(),
            InsertOutcome::Inserted
        );
    }

    let summary = store.window_summary(0, 1000, 0, 100).await.unwrap();
    assert_eq!(summary.list.len(), 3);

    cleanup(db_path).await;
}

#[tokio::test]
async fn batch_isolates_blank_names() {
    let (store, db_path) = fresh_store("mentions-batch").await;

    store.insert_event(event(1, 100)).await.unwrap();

    let batch = vec![
        mention(1, 100, "Alice"),
        mention(1, 100, ""),
        mention(1, 101, "Bob"),
        mention(1, 100, "Alice"), // duplicate of the first
    ];
    let outcome = store.insert_mentions(batch).await.unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.already_present, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 1);
    assert!(matches!(
        outcome.failures[0].error,
        gdelt_store::StoreError::Validation(_)
    ));

    cleanup(db_path).await;
}

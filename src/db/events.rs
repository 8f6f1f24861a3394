//! Event store operations. Rows are first-write-wins on `id`: a re-insert of
//! an existing id leaves the stored row untouched and reports `AlreadyPresent`.

use futures::StreamExt;
use futures::stream;
use sqlx::SqlitePool;

use crate::db::models::{BatchOutcome, EventFact, InsertOutcome};
use crate::error::StoreError;

pub(crate) async fn insert_event(
    pool: &SqlitePool,
    event: &EventFact,
) -> Result<InsertOutcome, StoreError> {
    event.validate()?;

    let res = sqlx::query(
        r"
        INSERT INTO export (id, actor_name, event_code, lat, long, goldstein, num_mentions, tms, source_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        ",
    )
    .bind(event.id)
    .bind(&event.actor_name)
    .bind(&event.event_code)
    .bind(event.lat)
    .bind(event.long)
    .bind(event.goldstein)
    .bind(event.num_mentions)
    .bind(event.tms)
    .bind(&event.source_url)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        Ok(InsertOutcome::AlreadyPresent)
    } else {
        Ok(InsertOutcome::Inserted)
    }
}

/// Independent idempotent inserts, fanned out with a fixed concurrency cap so
/// large batches cannot starve the connection pool. Per-row failures are
/// collected in the outcome; no failure aborts sibling rows.
pub(crate) async fn insert_events(
    pool: &SqlitePool,
    events: Vec<EventFact>,
    concurrency: usize,
) -> BatchOutcome {
    let results: Vec<(usize, Result<InsertOutcome, StoreError>)> =
        stream::iter(events.into_iter().enumerate())
            .map(|(index, event)| {
                let pool = pool.clone();
                async move { (index, insert_event(&pool, &event).await) }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let mut outcome = BatchOutcome::default();
    for (index, result) in results {
        outcome.record(index, result);
    }
    outcome
}

/// Look up a stored event by id.
pub(crate) async fn event_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<EventFact>, StoreError> {
    let row = sqlx::query_as::<_, EventFact>(
        r"
        SELECT id, actor_name, event_code, lat, long, goldstein, num_mentions, tms, source_url
        FROM export
        WHERE id = ?
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

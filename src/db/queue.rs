//! Master queue operations: register, poll, mark fetched.
//!
//! Each entry moves `pending (fetched=0)` to `done (fetched=1)` exactly once.
//! There is no transition back; re-registering a done entry must not revive it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::models::QueueEntry;
use crate::error::StoreError;

/// Idempotent upsert of a discovered resource. On conflict the row's `type`
/// is rewritten to itself and nothing else: `url` and `fetched` keep their
/// stored values, so a completed fetch is never regressed to pending.
pub(crate) async fn register(
    pool: &SqlitePool,
    resource_type: &str,
    tms: i64,
    url: &str,
) -> Result<(), StoreError> {
    if resource_type.trim().is_empty() {
        return Err(StoreError::Validation(
            "queue entry has an empty resource type".to_string(),
        ));
    }
    if url.trim().is_empty() {
        return Err(StoreError::Validation(format!(
            "queue entry ({resource_type}, {tms}) has an empty url"
        )));
    }

    sqlx::query(
        r"
        INSERT INTO master (type, tms, url, fetched)
        VALUES (?, ?, ?, 0)
        ON CONFLICT(type, tms) DO UPDATE SET type = excluded.type
        ",
    )
    .bind(resource_type)
    .bind(tms)
    .bind(url)
    .execute(pool)
    .await?;

    Ok(())
}

/// All unfetched entries of `resource_type` with `tms` in the half-open
/// window `[start, end)`. `start` defaults to 0, `end` to the current unix
/// time. Result ordering is unspecified.
pub(crate) async fn poll_unfetched(
    pool: &SqlitePool,
    resource_type: &str,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<Vec<QueueEntry>, StoreError> {
    let start = start.unwrap_or(0);
    let end = end.unwrap_or_else(|| Utc::now().timestamp());

    let rows = sqlx::query_as::<_, QueueEntry>(
        r"
        SELECT type, tms, url, fetched
        FROM master
        WHERE type = ? AND tms >= ? AND tms < ? AND fetched = 0
        ",
    )
    .bind(resource_type)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Flip the matching entry to fetched. A missing entry is a no-op; the queue
/// does not guarantee the entry was registered before being marked.
pub(crate) async fn mark_fetched(
    pool: &SqlitePool,
    resource_type: &str,
    tms: i64,
) -> Result<(), StoreError> {
    let res = sqlx::query("UPDATE master SET fetched = 1 WHERE type = ? AND tms = ?")
        .bind(resource_type)
        .bind(tms)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        debug!(resource_type, tms, "mark_fetched matched no queue entry");
    }

    Ok(())
}

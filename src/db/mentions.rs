//! Mention store operations. Uniqueness lives on `(event, tms, name)`; two
//! fetch jobs racing on the same mention is expected, and the loser sees
//! `AlreadyPresent`, never an error.

use futures::StreamExt;
use futures::stream;
use sqlx::SqlitePool;

use crate::db::models::{BatchOutcome, InsertOutcome, MentionFact};
use crate::error::StoreError;

pub(crate) async fn insert_mention(
    pool: &SqlitePool,
    mention: &MentionFact,
) -> Result<InsertOutcome, StoreError> {
    mention.validate()?;

    let res = sqlx::query(
        r"
        INSERT INTO mentions (event, tms, name, confidence, tone)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(event, tms, name) DO NOTHING
        ",
    )
    .bind(mention.event)
    .bind(mention.tms)
    .bind(&mention.name)
    .bind(mention.confidence)
    .bind(mention.tone)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        Ok(InsertOutcome::AlreadyPresent)
    } else {
        Ok(InsertOutcome::Inserted)
    }
}

/// Same bounded-batch contract as the event store: independent idempotent
/// inserts under a fixed concurrency cap, per-row failures isolated.
pub(crate) async fn insert_mentions(
    pool: &SqlitePool,
    mentions: Vec<MentionFact>,
    concurrency: usize,
) -> BatchOutcome {
    let results: Vec<(usize, Result<InsertOutcome, StoreError>)> =
        stream::iter(mentions.into_iter().enumerate())
            .map(|(index, mention)| {
                let pool = pool.clone();
                async move { (index, insert_mention(&pool, &mention).await) }
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

//! Windowed aggregation over the mention/event join.
//!
//! The base relation is `mentions INNER JOIN export` bounded to
//! `[start, end)` on the mention timestamp, paginated by (offset, limit).
//! Both ranked summaries are computed over that *page*, not the full window.
//! Known limitation, kept on purpose: query cost stays bounded by the page
//! size, at the price of ranking only what the page contains.
//!
//! Ties in the rankings are broken deterministically: name ascending for
//! `topMentions`, event id ascending for `topEvents`.

use sqlx::SqlitePool;

use crate::db::models::{MentionRow, TopEvent, TopMention, WindowSummary};
use crate::error::StoreError;

/// Paginated join of mentions to their events; binds are
/// (start, end, limit, offset).
const PAGE_SQL: &str = r"
    SELECT
        m.id,
        m.event,
        m.tone,
        m.name,
        e.actor_name,
        e.event_code,
        e.lat,
        e.long,
        e.tms AS event_tms,
        e.source_url,
        e.goldstein AS event_goldstein
    FROM mentions AS m
    INNER JOIN export AS e ON e.id = m.event
    WHERE m.tms >= ? AND m.tms < ?
    LIMIT ? OFFSET ?
";

pub(crate) async fn window_summary(
    pool: &SqlitePool,
    start: i64,
    end: i64,
    offset: i64,
    limit: i64,
) -> Result<WindowSummary, StoreError> {
    if limit < 0 || offset < 0 {
        return Err(StoreError::Validation(
            "offset and limit must be non-negative".to_string(),
        ));
    }

    let top_mentions_sql = format!(
        r"
        SELECT r.name, COUNT(*) AS count
        FROM ({PAGE_SQL}) AS r
        GROUP BY r.name
        HAVING COUNT(*) > 2
        ORDER BY count DESC, r.name ASC
        LIMIT 20
        "
    );
    let top_events_sql = format!(
        r"
        SELECT r.event, COUNT(*) AS count, r.actor_name, r.event_code, r.source_url
        FROM ({PAGE_SQL}) AS r
        GROUP BY r.event
        HAVING COUNT(*) > 1
        ORDER BY count DESC, r.event ASC
        LIMIT 20
        "
    );

    let list = sqlx::query_as::<_, MentionRow>(PAGE_SQL)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool);
    let top_mentions = sqlx::query_as::<_, TopMention>(&top_mentions_sql)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool);
    let top_events = sqlx::query_as::<_, TopEvent>(&top_events_sql)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool);

    // One logical request, three result sets: either all land or the whole
    // summary fails.
    let (list, top_mentions, top_events) = futures::try_join!(list, top_mentions, top_events)
        .map_err(StoreError::Query)?;

    Ok(WindowSummary {
        list,
        top_mentions,
        top_events,
    })
}

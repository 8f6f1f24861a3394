use backon::{ExponentialBuilder, Retryable};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{info, warn};

use crate::db::models::{
    BatchOutcome, EventFact, InsertOutcome, MentionFact, QueueEntry, WindowSummary,
};
use crate::db::schema::SQLITE_INIT;
use crate::db::{events, mentions, queue, window};
use crate::error::StoreError;

/// Pool and batching knobs for the store actor.
#[derive(Debug, Clone)]
pub struct DbSettings {
    pub database_url: String,

    /// Connection pool ceiling. All store operations multiplex over this.
    pub max_connections: u32,

    /// Fan-out cap for batch inserts, decoupled from the pool size so a large
    /// batch cannot monopolize every connection.
    pub insert_concurrency: usize,
}

impl DbSettings {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 64,
            insert_concurrency: 16,
        }
    }
}

#[derive(Debug)]
pub enum DbActorMessage {
    /// Register a discovered resource in the master queue (idempotent).
    Register(String, i64, String, RpcReplyPort<Result<(), StoreError>>),

    /// Unfetched queue entries of a type within `[start, end)`.
    PollUnfetched(
        String,
        Option<i64>,
        Option<i64>,
        RpcReplyPort<Result<Vec<QueueEntry>, StoreError>>,
    ),

    /// Transition a queue entry to fetched (no-op if absent).
    MarkFetched(String, i64, RpcReplyPort<Result<(), StoreError>>),

    /// Insert one event fact, first-write-wins on id.
    InsertEvent(EventFact, RpcReplyPort<Result<InsertOutcome, StoreError>>),

    /// Insert a batch of event facts with bounded fan-out.
    InsertEvents(Vec<EventFact>, RpcReplyPort<Result<BatchOutcome, StoreError>>),

    /// Insert one mention, no-op on a duplicate (event, tms, name).
    InsertMention(MentionFact, RpcReplyPort<Result<InsertOutcome, StoreError>>),

    /// Insert a batch of mentions with bounded fan-out.
    InsertMentions(
        Vec<MentionFact>,
        RpcReplyPort<Result<BatchOutcome, StoreError>>,
    ),

    /// Look up one event fact by id.
    GetEvent(i64, RpcReplyPort<Result<Option<EventFact>, StoreError>>),

    /// Windowed three-part aggregation: (start, end, offset, limit).
    WindowSummary(
        i64,
        i64,
        i64,
        i64,
        RpcReplyPort<Result<WindowSummary, StoreError>>,
    ),

    /// Create all tables if absent, then clear them. Test/reset environments
    /// only.
    Truncate(RpcReplyPort<Result<(), StoreError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn register(
        &self,
        resource_type: &str,
        tms: i64,
        url: &str,
    ) -> Result<(), StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::Register,
            resource_type.to_string(),
            tms,
            url.to_string()
        )
        .map_err(|e| StoreError::Ractor(format!("DbActor Register RPC failed: {e}")))?
    }

    pub async fn poll_unfetched(
        &self,
        resource_type: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<QueueEntry>, StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::PollUnfetched,
            resource_type.to_string(),
            start,
            end
        )
        .map_err(|e| StoreError::Ractor(format!("DbActor PollUnfetched RPC failed: {e}")))?
    }

    pub async fn mark_fetched(&self, resource_type: &str, tms: i64) -> Result<(), StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::MarkFetched,
            resource_type.to_string(),
            tms
        )
        .map_err(|e| StoreError::Ractor(format!("DbActor MarkFetched RPC failed: {e}")))?
    }

    pub async fn insert_event(&self, event: EventFact) -> Result<InsertOutcome, StoreError> {
        ractor::call!(self.actor, DbActorMessage::InsertEvent, event)
            .map_err(|e| StoreError::Ractor(format!("DbActor InsertEvent RPC failed: {e}")))?
    }

    pub async fn insert_events(&self, events: Vec<EventFact>) -> Result<BatchOutcome, StoreError> {
        ractor::call!(self.actor, DbActorMessage::InsertEvents, events)
            .map_err(|e| StoreError::Ractor(format!("DbActor InsertEvents RPC failed: {e}")))?
    }

    pub async fn insert_mention(&self, mention: MentionFact) -> Result<InsertOutcome, StoreError> {
        ractor::call!(self.actor, DbActorMessage::InsertMention, mention)
            .map_err(|e| StoreError::Ractor(format!("DbActor InsertMention RPC failed: {e}")))?
    }

    pub async fn insert_mentions(
        &self,
        mentions: Vec<MentionFact>,
    ) -> Result<BatchOutcome, StoreError> {
        ractor::call!(self.actor, DbActorMessage::InsertMentions, mentions)
            .map_err(|e| StoreError::Ractor(format!("DbActor InsertMentions RPC failed: {e}")))?
    }

    pub async fn get_event(&self, id: i64) -> Result<Option<EventFact>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::GetEvent, id)
            .map_err(|e| StoreError::Ractor(format!("DbActor GetEvent RPC failed: {e}")))?
    }

    pub async fn window_summary(
        &self,
        start: i64,
        end: i64,
        offset: i64,
        limit: i64,
    ) -> Result<WindowSummary, StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::WindowSummary,
            start,
            end,
            offset,
            limit
        )
        .map_err(|e| StoreError::Ractor(format!("DbActor WindowSummary RPC failed: {e}")))?
    }

    pub async fn truncate(&self) -> Result<(), StoreError> {
        ractor::call!(self.actor, DbActorMessage::Truncate)
            .map_err(|e| StoreError::Ractor(format!("DbActor Truncate RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
    insert_concurrency: usize,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = DbSettings;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        settings: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(settings.database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Establishment failures are transient connection errors: retry with
        // backoff, then fail actor startup so the caller sees the error.
        let pool = (|| {
            let connect_opts = connect_opts.clone();
            async move {
                SqlitePoolOptions::new()
                    .max_connections(settings.max_connections)
                    .connect_with(connect_opts)
                    .await
            }
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(100))
                .with_max_times(3),
        )
        .notify(|err, dur| {
            warn!(error = %err, backoff = ?dur, "db connect failed, retrying");
        })
        .await
        .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!(
            max_connections = settings.max_connections,
            insert_concurrency = settings.insert_concurrency,
            "DbActor initialized"
        );
        Ok(DbActorState {
            pool,
            insert_concurrency: settings.insert_concurrency,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Register(resource_type, tms, url, reply) => {
                let res = queue::register(&state.pool, &resource_type, tms, &url).await;
                let _ = reply.send(res);
            }
            DbActorMessage::PollUnfetched(resource_type, start, end, reply) => {
                let res = queue::poll_unfetched(&state.pool, &resource_type, start, end).await;
                let _ = reply.send(res);
            }
            DbActorMessage::MarkFetched(resource_type, tms, reply) => {
                let res = queue::mark_fetched(&state.pool, &resource_type, tms).await;
                let _ = reply.send(res);
            }
            DbActorMessage::InsertEvent(event, reply) => {
                let res = events::insert_event(&state.pool, &event).await;
                let _ = reply.send(res);
            }
            DbActorMessage::InsertEvents(batch, reply) => {
                let res = events::insert_events(&state.pool, batch, state.insert_concurrency).await;
                let _ = reply.send(Ok(res));
            }
            DbActorMessage::InsertMention(mention, reply) => {
                let res = mentions::insert_mention(&state.pool, &mention).await;
                let _ = reply.send(res);
            }
            DbActorMessage::InsertMentions(batch, reply) => {
                let res =
                    mentions::insert_mentions(&state.pool, batch, state.insert_concurrency).await;
                let _ = reply.send(Ok(res));
            }
            DbActorMessage::GetEvent(id, reply) => {
                let res = events::event_by_id(&state.pool, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::WindowSummary(start, end, offset, limit, reply) => {
                let res = window::window_summary(&state.pool, start, end, offset, limit).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Truncate(reply) => {
                let res = truncate_all(&state.pool).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle. Connection
/// establishment failure surfaces here instead of being swallowed.
pub async fn spawn(settings: DbSettings) -> Result<DbActorHandle, StoreError> {
    // Unnamed: several stores may coexist in one process (tests do this).
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, settings)
        .await
        .map_err(|e| StoreError::Connection(format!("failed to start DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

/// Administrative reset: make sure all three tables exist, then clear them.
async fn truncate_all(pool: &SqlitePool) -> Result<(), StoreError> {
    apply_schema(pool).await?;
    for table in ["master", "export", "mentions"] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await?;
    }
    Ok(())
}

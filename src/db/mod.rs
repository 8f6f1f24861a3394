//! Persistence core: master queue, fact stores and the window aggregator,
//! all multiplexed over one SQLite pool owned by the db actor.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and query results
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `queue.rs` / `events.rs` / `mentions.rs` / `window.rs`: SQL per component
//! - `actor.rs`: pool ownership and the public `DbActorHandle`

pub mod actor;
pub mod models;
pub mod schema;

mod events;
mod mentions;
mod queue;
mod window;

pub use actor::{DbActorHandle, DbSettings, spawn};
pub use models::{
    BatchFailure, BatchOutcome, EventFact, InsertOutcome, MentionFact, MentionRow, QueueEntry,
    TopEvent, TopMention, WindowSummary,
};
pub use schema::SQLITE_INIT;

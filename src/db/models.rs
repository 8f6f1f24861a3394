use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::StoreError;

/// A discovered resource awaiting fetch. One row per (type, tms).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct QueueEntry {
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub resource_type: String,
    pub tms: i64,
    pub url: String,
    pub fetched: bool,
}

/// One geopolitical event fact. `id` is assigned by the source feed,
/// `num_mentions` is the feed's own count, not derived from mention rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct EventFact {
    pub id: i64,
    pub actor_name: Option<String>,
    pub event_code: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub goldstein: i64,
    pub num_mentions: i64,
    pub tms: i64,
    pub source_url: String,
}

impl EventFact {
    /// Rows are immutable once written; reject semantically-empty
    /// required fields before they reach the database.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.source_url.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "event {} has an empty source_url",
                self.id
            )));
        }
        Ok(())
    }
}

/// One actor mention tied to an event. The mention `tms` may differ from the
/// event's own timestamp (mentions can be reported later). The surrogate id
/// is assigned by the database on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentionFact {
    pub event: i64,
    pub tms: i64,
    pub name: String,
    pub confidence: i64,
    pub tone: f64,
}

impl MentionFact {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "mention of event {} has an empty actor name",
                self.event
            )));
        }
        Ok(())
    }
}

/// Result of an idempotent insert. Duplicate keys are an expected outcome,
/// reported as `AlreadyPresent` rather than surfaced as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// Per-row accounting for a batch insert. Row failures never abort siblings.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub already_present: usize,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug)]
pub struct BatchFailure {
    /// Index of the offending row within the submitted batch.
    pub index: usize,
    pub error: StoreError,
}

impl BatchOutcome {
    pub(crate) fn record(&mut self, index: usize, result: Result<InsertOutcome, StoreError>) {
        match result {
            Ok(InsertOutcome::Inserted) => self.inserted += 1,
            Ok(InsertOutcome::AlreadyPresent) => self.already_present += 1,
            Err(error) => self.failures.push(BatchFailure { index, error }),
        }
    }
}

/// One row of the windowed mention/event join, mention fields first,
/// event fields denormalized alongside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct MentionRow {
    pub id: i64,
    pub event: i64,
    pub tone: f64,
    pub name: String,
    pub actor_name: Option<String>,
    pub event_code: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub event_tms: i64,
    pub source_url: String,
    pub event_goldstein: i64,
}

/// An actor name mentioned more than twice within the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct TopMention {
    pub name: String,
    pub count: i64,
}

/// An event mentioned more than once within the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct TopEvent {
    pub event: i64,
    pub count: i64,
    pub actor_name: Option<String>,
    pub event_code: Option<String>,
    pub source_url: String,
}

/// The three-part result of a windowed aggregation request. All three parts
/// are computed over the same paginated base join; a request either yields
/// the full summary or fails as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    pub list: Vec<MentionRow>,
    pub top_mentions: Vec<TopMention>,
    pub top_events: Vec<TopEvent>,
}

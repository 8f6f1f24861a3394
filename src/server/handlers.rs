use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::debug;

use crate::db::WindowSummary;
use crate::error::StoreError;
use crate::server::router::AppState;

/// Query parameters for the windowed mentions view. The window is half-open:
/// `[start, end)` in unix seconds.
#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    1000
}

/// GET /api/mentions — the three-part windowed summary consumed by the
/// timeline UI. Ranked summaries are page-scoped (see `db::window`).
pub async fn mentions_window(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<WindowSummary>, StoreError> {
    if params.start > params.end {
        return Err(StoreError::Validation(format!(
            "window start {} is after end {}",
            params.start, params.end
        )));
    }

    debug!(
        start = params.start,
        end = params.end,
        offset = params.offset,
        limit = params.limit,
        "serving mentions window"
    );

    let summary = state
        .db
        .window_summary(params.start, params.end, params.offset, params.limit)
        .await?;
    Ok(Json(summary))
}

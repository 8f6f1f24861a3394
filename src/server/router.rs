use axum::{Router, http::StatusCode, routing::get};

use crate::db::DbActorHandle;
use crate::server::handlers::mentions_window;

#[derive(Clone)]
pub struct AppState {
    pub db: DbActorHandle,
}

impl AppState {
    pub fn new(db: DbActorHandle) -> Self {
        Self { db }
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/mentions", get(mentions_window))
        .fallback(not_found_handler)
        .with_state(state)
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StoreError {
    /// The pool could not establish or lease a connection. Fatal to the
    /// invoking call; always propagated, never swallowed.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// A malformed input row. Fatal to that single row's insert; batch
    /// operations collect these without aborting sibling rows.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A failing aggregation query. The three-part window result is
    /// all-or-nothing, so this aborts the whole request.
    #[error("window query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("ractor error: {0}")]
    Ractor(String),
}

impl IntoResponse for StoreError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            StoreError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_INPUT".to_string(),
                    message: msg.clone(),
                },
            ),
            StoreError::Query(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "QUERY_FAILED".to_string(),
                    message: "The aggregation query failed.".to_string(),
                },
            ),
            StoreError::Connection(_) | StoreError::Database(_) | StoreError::Ractor(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                },
            ),
        };
        (status, Json(ApiErrorBody { inner: body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

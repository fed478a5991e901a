use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Engine error taxonomy.
///
/// Lifecycle and validation failures are reported verbatim to the caller;
/// storage and driver failures are logged server-side and masked. "Already
/// finalized" is deliberately absent: a repeated finalize is an expected
/// recovery path and returns the stored result as a success.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    NotFound(String),

    /// Ownership violations and assessments outside their availability
    /// window. Blocking; no retry offered.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            EngineError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            EngineError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            EngineError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            EngineError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::Validation(err.to_string())
    }
}

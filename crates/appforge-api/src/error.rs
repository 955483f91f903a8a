//! HTTP error mapping.

use appforge_orchestrator::GenerateError;
use appforge_state::StateError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors returned by handlers, rendered as `{success: false, error}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Client went away mid-generation.
    #[error("request cancelled")]
    Cancelled,

    /// Details are logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            ApiError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "request cancelled"),
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Validation(msg) => ApiError::BadRequest(msg),
            GenerateError::Persistence(e) => ApiError::Internal(e.to_string()),
            GenerateError::Cancelled => ApiError::Cancelled,
        }
    }
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_not_leaked() {
        let resp = ApiError::Internal("disk on fire at /var/lib".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generate_errors_map_to_status() {
        let bad: ApiError = GenerateError::Validation("empty".into()).into();
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let persist: ApiError = GenerateError::Persistence(StateError::Write("full".into())).into();
        assert!(matches!(persist, ApiError::Internal(_)));
    }
}

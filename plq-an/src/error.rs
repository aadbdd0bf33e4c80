//! Error types for plq-an HTTP API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::AnalysisError;
use crate::spotify::SpotifyError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed playlist id (400)
    #[error("Invalid Spotify playlist id: {0}")]
    InvalidSpotifyId(String),

    /// Malformed task id (400)
    #[error("Invalid task id: {0}")]
    InvalidTaskId(String),

    /// Unknown task (404)
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task has no result yet (400)
    #[error("Task not completed: {0}")]
    TaskNotCompleted(String),

    /// Task finished with an error (500)
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Analysis already running (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Catalog service unavailable or misbehaving (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SpotifyError> for ApiError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Spotify(e) => e.into(),
            AnalysisError::VersionNotFound(id) => ApiError::NotFound(id.to_string()),
            AnalysisError::InProgress(id) => ApiError::Conflict(format!(
                "Analysis already running for version {}",
                id
            )),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::InvalidSpotifyId(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_SPOTIFY_ID", msg)
            }
            ApiError::InvalidTaskId(msg) => (StatusCode::BAD_REQUEST, "INVALID_TASK_ID", msg),
            ApiError::TaskNotFound(msg) => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND", msg),
            ApiError::TaskNotCompleted(msg) => {
                (StatusCode::BAD_REQUEST, "TASK_NOT_COMPLETED", msg)
            }
            ApiError::TaskFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_FAILED", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::InvalidSpotifyId("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidTaskId("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::TaskNotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::TaskNotCompleted("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Upstream("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_analysis_error_mapping() {
        let not_found: ApiError =
            AnalysisError::Spotify(SpotifyError::NotFound("/playlists/x".into())).into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let rate_limited: ApiError = AnalysisError::Spotify(SpotifyError::RateLimitExceeded).into();
        assert!(matches!(rate_limited, ApiError::Upstream(_)));

        let busy: ApiError = AnalysisError::InProgress(Uuid::nil()).into();
        assert!(matches!(busy, ApiError::Conflict(_)));
    }
}

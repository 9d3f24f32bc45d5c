//! Error types for ccrm-api
//!
//! Every failure leaves the server as `{"success": false, "error": "..."}`.
//! Store failures are logged with full detail and reported with a generic
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// ccrm-common error, classified by variant
    #[error("Common error: {0}")]
    Common(#[from] ccrm_common::Error),
}

const GENERIC_FAILURE: &str = "Internal server error";

impl ApiError {
    /// HTTP status and client-facing message
    fn status_and_message(self) -> (StatusCode, String) {
        use ccrm_common::Error as CommonError;

        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            ApiError::Common(CommonError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Common(CommonError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", what))
            }
            ApiError::Common(CommonError::AlreadyExists(what)) => {
                (StatusCode::CONFLICT, format!("Already exists: {}", what))
            }
            ApiError::Common(err) => {
                error!("Store failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = Json(json!({
            "success": false,
            "error": message,
        }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_common_errors_map_to_status() {
        use ccrm_common::Error as CommonError;

        assert_eq!(
            status_of(CommonError::InvalidInput("x".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CommonError::not_found("callCenters", "a").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CommonError::AlreadyExists("a".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CommonError::Internal("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let (_, message) = ApiError::Internal("disk on fire".into()).status_and_message();
        assert_eq!(message, GENERIC_FAILURE);
    }
}

//! HTTP-facing errors.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use todo_auth::AuthError;
use todo_auth::middleware::error_body;
use todo_storage::{ErrorCategory, StorageError};

/// Errors returned by handlers, mapped to a status and a `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed; rendered by `AuthError` itself.
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Duplicate account.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Storage(StorageError),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) if e.is_authentication_failure() => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::InvalidIdentity { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err.category() {
            // Only account creation can collide; matches the signup response.
            ErrorCategory::Conflict => ApiError::conflict("User already registered"),
            _ => ApiError::Storage(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Auth(e) => return e.into_response(),
            ApiError::Storage(e) => {
                tracing::error!(error = %e, category = %e.category(), "Record store failure");
                "Internal server error".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
            ApiError::Validation(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => msg,
        };
        (status, Json(error_body(&message))).into_response()
    }
}

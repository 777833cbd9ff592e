//! Error responses for authentication failures.
//!
//! Bodies use the same `{"error": "..."}` shape as the rest of the API.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = client_message(&self);

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let challenge = format!(
                "Bearer realm=\"todo\", error=\"invalid_token\", error_description=\"{}\"",
                message.replace('"', "'")
            );
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication failed internally");
        }

        (status, headers, Json(error_body(&message))).into_response()
    }
}

/// Builds the JSON error body used by every error response.
#[must_use]
pub fn error_body(message: &str) -> Value {
    json!({ "error": message })
}

fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::Unauthorized { .. } | AuthError::InvalidToken { .. } | AuthError::TokenExpired => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::InvalidIdentity { .. } => StatusCode::BAD_REQUEST,
        AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn client_message(error: &AuthError) -> String {
    match error {
        AuthError::Unauthorized { message } => message.clone(),
        AuthError::InvalidToken { .. } => "Invalid token".to_string(),
        AuthError::TokenExpired => "Token has expired".to_string(),
        AuthError::InvalidIdentity { .. } => "Invalid user id in token".to_string(),
        AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            "Internal server error".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_carries_challenge() {
        let resp = AuthError::unauthorized("Missing Authorization header").into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let challenge = resp
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(challenge.starts_with("Bearer realm=\"todo\""));
    }

    #[test]
    fn test_identity_error_is_bad_request() {
        let resp = AuthError::invalid_identity("sub").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_internal_hides_details() {
        assert_eq!(
            client_message(&AuthError::internal("db password leaked")),
            "Internal server error"
        );
        assert_eq!(
            status_for(&AuthError::configuration("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_shape() {
        assert_eq!(error_body("nope"), json!({"error": "nope"}));
    }
}

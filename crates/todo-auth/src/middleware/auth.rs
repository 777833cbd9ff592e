//! Bearer token authentication extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AuthError;
use crate::token::jwt::{AccessTokenClaims, JwtError, JwtService};

use super::types::AuthContext;

// =============================================================================
// Auth State
// =============================================================================

/// State required by the [`BearerAuth`] extractor.
///
/// Include it in the application state and expose it through `FromRef`.
#[derive(Clone, Debug)]
pub struct AuthState {
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }

    /// Validates a raw bearer token and builds the request identity.
    ///
    /// # Errors
    ///
    /// - `TokenExpired` if the token is past its `exp`
    /// - `InvalidToken` if the signature, issuer, or encoding is wrong
    /// - `InvalidIdentity` if the subject is not a well-formed owner id
    pub fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = self
            .jwt_service
            .decode::<AccessTokenClaims>(token)
            .map_err(|e| {
                tracing::debug!(error = %e, "Failed to decode token");
                match e {
                    JwtError::Expired => AuthError::TokenExpired,
                    other => AuthError::invalid_token(other.to_string()),
                }
            })?
            .claims;

        let owner_id = claims.owner_id().map_err(|e| {
            tracing::debug!(jti = %claims.jti, error = %e, "Token subject is not an owner id");
            AuthError::invalid_identity(e.to_string())
        })?;

        Ok(AuthContext {
            owner_id,
            token_claims: Arc::new(claims),
        })
    }
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor that validates `Authorization: Bearer <token>` and yields
/// the caller's [`AuthContext`].
///
/// Rejects with [`AuthError`], which renders as a JSON error response.
pub struct BearerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AuthError::unauthorized("Missing Authorization header"))?
            .to_str()
            .map_err(|_| AuthError::unauthorized("Malformed Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AuthError::unauthorized("Authorization scheme must be Bearer"))?;

        if token.is_empty() {
            return Err(AuthError::unauthorized("Empty Bearer token"));
        }

        auth_state.authenticate(token).map(BearerAuth)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::Request;
    use todo_storage::OwnerId;

    use super::*;

    fn state() -> AuthState {
        AuthState::new(Arc::new(JwtService::hs256(
            b"middleware-test-secret-0123",
            "todo-server",
        )))
    }

    async fn extract(state: &AuthState, header: Option<&str>) -> Result<BearerAuth, AuthError> {
        let mut builder = Request::builder().uri("/api/todos");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        BearerAuth::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn test_valid_token() {
        let state = state();
        let owner = OwnerId::new();
        let token = state
            .jwt_service
            .issue_access_token(owner, "a@example.com", Duration::from_secs(60))
            .unwrap();

        let BearerAuth(ctx) = extract(&state, Some(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(ctx.owner_id, owner);
        assert_eq!(ctx.email(), Some("a@example.com"));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let err = extract(&state(), None).await.err().unwrap();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_wrong_scheme() {
        let err = extract(&state(), Some("Basic dXNlcjpwYXNz"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let err = extract(&state(), Some("Bearer not.a.jwt"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let state = state();
        let mut claims =
            AccessTokenClaims::new("todo-server", OwnerId::new(), None, Duration::from_secs(60));
        claims.exp = claims.iat - 3600;
        let token = state.jwt_service.encode(&claims).unwrap();

        let err = extract(&state, Some(&format!("Bearer {token}")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn test_malformed_subject_is_identity_error() {
        let state = state();
        let mut claims =
            AccessTokenClaims::new("todo-server", OwnerId::new(), None, Duration::from_secs(60));
        claims.sub = "not-a-uuid".into();
        let token = state.jwt_service.encode(&claims).unwrap();

        let err = extract(&state, Some(&format!("Bearer {token}")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::InvalidIdentity { .. }));
    }
}

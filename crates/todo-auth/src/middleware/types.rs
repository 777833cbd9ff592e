//! Authenticated request context.

use std::sync::Arc;

use todo_storage::OwnerId;

use crate::token::jwt::AccessTokenClaims;

/// Identity extracted from a verified bearer token.
///
/// Every todo operation is scoped to `owner_id`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated owner.
    pub owner_id: OwnerId,

    /// Validated token claims.
    pub token_claims: Arc<AccessTokenClaims>,
}

impl AuthContext {
    /// Returns the email recorded in the token, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.token_claims.email.as_deref()
    }

    /// Returns the token ID.
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.token_claims.jti
    }
}

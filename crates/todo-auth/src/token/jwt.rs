//! JWT token generation and validation.
//!
//! Access tokens are HS256-signed with a shared secret. The `sub` claim holds
//! the owner id; [`AccessTokenClaims::owner_id`] parses it into a typed
//! [`OwnerId`] so handlers never look at raw claim maps.
//!
//! ## Example
//!
//! ```ignore
//! use todo_auth::token::jwt::JwtService;
//!
//! let jwt_service = JwtService::hs256(b"a-long-shared-secret", "todo-server");
//! let token = jwt_service.issue_access_token(owner_id, "a@example.com", lifetime)?;
//! let data = jwt_service.decode::<AccessTokenClaims>(&token)?;
//! ```

use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_storage::OwnerId;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer | ErrorKind::MissingRequiredClaim(_) => {
                Self::invalid_claims(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Issuer.
    pub iss: String,

    /// Subject: the owner id.
    pub sub: String,

    /// Account email, informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// JWT ID.
    pub jti: String,
}

impl AccessTokenClaims {
    /// Builds claims for `owner` valid for `lifetime` from now.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        owner: OwnerId,
        email: Option<String>,
        lifetime: Duration,
    ) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        Self {
            iss: issuer.into(),
            sub: owner.to_string(),
            email,
            exp: now.saturating_add(lifetime),
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Parses the subject into an owner id.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidClaims` if the subject is empty or not a UUID.
    pub fn owner_id(&self) -> Result<OwnerId, JwtError> {
        if self.sub.is_empty() {
            return Err(JwtError::invalid_claims("subject is empty"));
        }
        self.sub
            .parse()
            .map_err(|_| JwtError::invalid_claims(format!("subject is not an owner id: {}", self.sub)))
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Signs and verifies access tokens.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Creates an HS256 service from a shared secret.
    #[must_use]
    pub fn hs256(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
        }
    }

    /// Encodes claims into a JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and validates a JWT string (signature, issuer, expiration).
    ///
    /// # Errors
    /// Returns an error if decoding or validation fails.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false;

        decode(token, &self.decoding_key, &validation).map_err(JwtError::from)
    }

    /// Issues a signed access token for `owner`.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_access_token(
        &self,
        owner: OwnerId,
        email: &str,
        lifetime: Duration,
    ) -> Result<String, JwtError> {
        let claims = AccessTokenClaims::new(&self.issuer, owner, Some(email.to_string()), lifetime);
        self.encode(&claims)
    }

    /// Returns the issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

// ============================================================================
// Tests
// ============================================================================

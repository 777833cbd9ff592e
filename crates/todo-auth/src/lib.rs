//! # todo-auth
//!
//! Authentication for the todo server.
//!
//! This crate provides:
//! - HS256 access token issuance and validation
//! - Argon2id password hashing
//! - An Axum `BearerAuth` extractor that turns a bearer token into a typed
//!   [`AuthContext`] carrying the owner identity
//!
//! ## Modules
//!
//! - [`config`] - Authentication configuration
//! - [`token`] - Token generation and validation
//! - [`password`] - Password hashing and verification
//! - [`middleware`] - HTTP extractors and error responses

pub mod config;
pub mod error;
pub mod middleware;
pub mod password;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use middleware::{AuthContext, AuthState, BearerAuth};
pub use token::jwt::{AccessTokenClaims, JwtError, JwtService};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use todo_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::AuthConfig;
    pub use crate::error::AuthError;
    pub use crate::middleware::{AuthContext, AuthState, BearerAuth};
    pub use crate::token::jwt::{AccessTokenClaims, JwtService};
    pub use crate::AuthResult;
}

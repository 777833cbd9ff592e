//! HTTP extractors and error responses for authenticated routes.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use todo_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn whoami(BearerAuth(auth): BearerAuth) -> String {
//!     auth.owner_id.to_string()
//! }
//!
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .with_state(AuthState::new(jwt_service));
//! ```

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{AuthState, BearerAuth};
pub use error::error_body;
pub use types::AuthContext;

//! Authentication configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum accepted length of the HS256 signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// jwt_secret = "change-me-to-something-long"
/// issuer = "http://localhost:3000"
/// token_lifetime = "24h"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret used to sign and verify HS256 access tokens.
    /// Usually supplied through `TODO__AUTH__JWT_SECRET`.
    pub jwt_secret: String,

    /// Token `iss` claim; tokens from another issuer are rejected.
    pub issuer: String,

    /// Lifetime of issued access tokens.
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "todo-server".to_string(),
            token_lifetime: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is too short, the issuer is empty, or
    /// the token lifetime is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::invalid(
                "jwt_secret",
                format!("must be at least {MIN_SECRET_LEN} bytes"),
            ));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::invalid("issuer", "must not be empty"));
        }
        if self.token_lifetime.is_zero() {
            return Err(ConfigError::invalid("token_lifetime", "must be > 0"));
        }
        Ok(())
    }
}

/// Configuration validation error.
#[derive(Debug, thiserror::Error)]
#[error("auth.{field} {message}")]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requires_secret() {
        let err = AuthConfig::default().validate().unwrap_err();
        assert_eq!(err.field, "jwt_secret");
    }

    #[test]
    fn test_valid_config() {
        let cfg = AuthConfig {
            jwt_secret: "0123456789abcdef0123".into(),
            ..AuthConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.token_lifetime, Duration::from_secs(86_400));
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let cfg = AuthConfig {
            jwt_secret: "0123456789abcdef0123".into(),
            token_lifetime: Duration::ZERO,
            ..AuthConfig::default()
        };
        assert!(cfg.validate().unwrap_err().to_string().contains("token_lifetime"));
    }
}

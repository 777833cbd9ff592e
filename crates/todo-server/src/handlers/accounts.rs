//! Signup and login.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use todo_auth::{AuthError, password};
use todo_storage::NewUser;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let email = req.email.trim().to_string();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("User already registered"));
    }

    // Argon2 is CPU-bound.
    let plain = req.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))?;

    let user = state
        .users
        .create(NewUser {
            username: req.username.trim().to_string(),
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created" })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::validation("User not found"))?;

    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || {
        password::verify_password(&req.password, &stored_hash)
    })
    .await
    .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?
    .map_err(|e| ApiError::internal(format!("stored password hash unreadable: {e}")))?;

    if !matches {
        tracing::debug!(user = %user.id, "login rejected");
        return Err(AuthError::unauthorized("Wrong password").into());
    }

    let token = state
        .auth
        .jwt_service
        .issue_access_token(user.id, &user.email, state.token_lifetime)
        .map_err(|e| ApiError::internal(format!("token issuance failed: {e}")))?;

    Ok(Json(json!({ "token": token })))
}

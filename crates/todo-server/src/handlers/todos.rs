//! `/api/todos` handlers. Every route requires a bearer token; the owner
//! comes from the verified token, never from the request body.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use todo_auth::BearerAuth;
use todo_storage::{TodoId, TodoPatch};

use crate::error::ApiError;
use crate::server::AppState;
use crate::service::CreateTodo;

fn parse_id(raw: &str) -> Result<TodoId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid todo id: {raw}")))
}

pub async fn create_todo(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
    body: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let todo = state.todos.create(auth.owner_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Todo created successfully", "todo": todo })),
    ))
}

pub async fn list_todos(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
) -> Result<impl IntoResponse, ApiError> {
    let list = state.todos.list(auth.owner_id).await?;
    Ok(Json(json!({ "todos": list.items, "cached": list.cached })))
}

pub async fn get_todo(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let todo = state.todos.get(id, auth.owner_id).await?;
    Ok(Json(json!({ "todo": todo })))
}

pub async fn update_todo(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
    Path(id): Path<String>,
    body: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = body?;
    let todo = state.todos.update(id, auth.owner_id, patch).await?;
    Ok(Json(json!({ "message": "Todo updated successfully", "todo": todo })))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let todo = state.todos.toggle(id, auth.owner_id).await?;
    Ok(Json(json!({
        "message": "Todo completion status toggled",
        "isCompleted": todo.is_completed,
        "todo": todo,
    })))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state.todos.delete(id, auth.owner_id).await?;
    Ok(Json(json!({ "message": "Todo deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = TodoId::new();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("64b7f0c2e4"), Err(ApiError::Validation(_))));
    }
}

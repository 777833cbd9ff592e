use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::cache::CacheBackend;
use crate::server::AppState;

pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "commit": env!("GIT_COMMIT"),
        })),
    )
}

/// Ready when the database (if any) answers. Redis is optional: an
/// unreachable L2 only degrades caching.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.cache_backend.mode();
    let l2 = match &state.cache_backend {
        CacheBackend::Local(_) => "disabled",
        backend if backend.is_redis_available().await => "up",
        _ => "down",
    };

    if let Some(pool) = &state.db_pool
        && let Err(e) = todo_db_postgres::ping(pool).await
    {
        tracing::warn!(error = %e, "readiness check failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "cache": cache, "l2": l2 })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({ "status": "ready", "cache": cache, "l2": l2 })),
    )
}

pub async fn metrics() -> impl IntoResponse {
    let body = crate::metrics::render_metrics().unwrap_or_default();
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        body,
    )
}

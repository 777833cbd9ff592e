use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, patch, post},
};
use todo_auth::{AuthState, JwtService};
use todo_db_postgres::PgPool;
use todo_storage::DynUserStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::{CacheBackend, TodoListCache};
use crate::config::AppConfig;
use crate::middleware::{RequestId, request_id};
use crate::service::TodoService;
use crate::{handlers, metrics};

/// Shared handler state. Every collaborator is constructed explicitly and
/// injected here.
#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
    pub users: DynUserStore,
    pub auth: AuthState,
    pub token_lifetime: Duration,
    pub cache_backend: CacheBackend,
    /// Present with the Postgres backend; used by `/readyz`.
    pub db_pool: Option<PgPool>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Connects the configured stores and cache.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let stores = crate::create_stores(&cfg.storage).await?;
        let cache_backend = crate::create_cache_backend(&cfg.redis).await;
        let jwt = JwtService::hs256(cfg.auth.jwt_secret.as_bytes(), cfg.auth.issuer.clone());

        Ok(Self {
            todos: TodoService::new(
                stores.todos,
                Arc::new(TodoListCache::new(cache_backend.clone(), cfg.todo_list_ttl())),
            ),
            users: stores.users,
            auth: AuthState::new(Arc::new(jwt)),
            token_lifetime: cfg.auth.token_lifetime,
            cache_backend,
            db_pool: stores.pool,
        })
    }
}

/// Builds the router around an existing state.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        .route("/api/signup", post(handlers::signup))
        .route("/api/login", post(handlers::login))
        .route(
            "/api/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/api/todos/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route("/api/todos/toggle/{id}", patch(handlers::toggle_todo))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.0.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(record_request))
        .layer(middleware::from_fn(request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

async fn record_request(
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let res = next.run(req).await;
    metrics::record_http_request(method.as_str(), res.status().as_u16());
    res
}

/// Builds the full application from configuration.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    metrics::init_metrics();
    let state = AppState::from_config(cfg).await?;
    Ok(router(state, cfg.server.body_limit_bytes))
}

pub struct TodoServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<TodoServer> {
        let app = build_app(&self.config).await?;
        Ok(TodoServer {
            addr: self.addr,
            app,
        })
    }
}

impl TodoServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            commit = env!("GIT_COMMIT"),
            "listening on {}",
            self.addr
        );
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

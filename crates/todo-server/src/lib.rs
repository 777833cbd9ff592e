pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod service;

use std::sync::Arc;

pub use cache::{CacheBackend, CachedEntry, TodoListCache};
pub use config::{
    AppConfig, CacheConfig, PostgresStorageConfig, RedisConfig, ServerConfig, StorageBackend,
    StorageConfig,
};
pub use error::ApiError;
pub use observability::init_tracing;
pub use server::{AppState, ServerBuilder, TodoServer, build_app, router};
pub use service::{CreateTodo, TodoList, TodoService};

use todo_storage::{DynTodoStore, DynUserStore};

/// Record stores selected by configuration.
pub struct Stores {
    pub todos: DynTodoStore,
    pub users: DynUserStore,
    /// Connection pool when the Postgres backend is active.
    pub pool: Option<todo_db_postgres::PgPool>,
}

/// Create the record stores for the configured backend.
///
/// The Postgres backend connects and runs migrations up front, so an
/// unreachable database fails startup instead of the first request.
pub async fn create_stores(config: &StorageConfig) -> anyhow::Result<Stores> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory record store");
            Ok(Stores {
                todos: todo_db_memory::create_todo_store(),
                users: todo_db_memory::create_user_store(),
                pool: None,
            })
        }
        StorageBackend::Postgres => {
            let pg = config.postgres.to_backend_config();
            tracing::info!(
                url = %todo_db_postgres::mask_password(&pg.url),
                "Using PostgreSQL record store"
            );
            let pool = todo_db_postgres::connect(&pg).await?;
            Ok(Stores {
                todos: Arc::new(todo_db_postgres::PostgresTodoStore::new(pool.clone())),
                users: Arc::new(todo_db_postgres::PostgresUserStore::new(pool.clone())),
                pool: Some(pool),
            })
        }
    }
}

/// Create a cache backend based on configuration.
///
/// With Redis disabled this is a local-only cache. With Redis enabled the
/// pool is created and probed once; any failure falls back to local-only so
/// the server still starts.
pub async fn create_cache_backend(config: &RedisConfig) -> CacheBackend {
    use std::time::Duration;

    if !config.enabled {
        tracing::info!("Redis disabled, using local cache only");
        return CacheBackend::new_local();
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let timeout = Some(Duration::from_millis(config.timeout_ms));
    let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
    pool_config.timeouts.wait = timeout;
    pool_config.timeouts.create = timeout;
    pool_config.timeouts.recycle = timeout;

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    redis_config.pool = Some(pool_config);

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to local cache."
            );
            return CacheBackend::new_local();
        }
    };

    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis");
            CacheBackend::new_redis(pool)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to local cache."
            );
            CacheBackend::new_local()
        }
    }
}

//! `TodoStore` backed by the `todos` table.
//!
//! Each operation is a single statement, so updates and toggles are atomic
//! without explicit transactions. `NOT is_completed` is evaluated by the
//! server against the current row.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use todo_storage::{
    NewTodo, OwnerId, StorageError, TodoId, TodoItem, TodoPatch, TodoStore, now_utc,
};

use crate::error::storage_err;

const COLUMNS: &str =
    "id, owner_id, title, description, is_completed, context, created_at, updated_at";

type TodoRow = (
    Uuid,
    Uuid,
    String,
    String,
    bool,
    String,
    OffsetDateTime,
    OffsetDateTime,
);

fn from_row(row: TodoRow) -> TodoItem {
    let (id, owner_id, title, description, is_completed, context, created_at, updated_at) = row;
    TodoItem {
        id: TodoId::from_uuid(id),
        owner_id: OwnerId::from_uuid(owner_id),
        title,
        description,
        is_completed,
        context,
        created_at,
        updated_at,
    }
}

/// PostgreSQL todo store.
#[derive(Debug, Clone)]
pub struct PostgresTodoStore {
    pool: PgPool,
}

impl PostgresTodoStore {
    /// Wraps an existing pool. Migrations must already be applied.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TodoStore for PostgresTodoStore {
    #[instrument(skip(self, new), fields(owner = %new.owner_id))]
    async fn insert(&self, new: NewTodo) -> Result<TodoItem, StorageError> {
        let item = TodoItem::create(new, now_utc());
        let sql = format!(
            "INSERT INTO todos ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COLUMNS}"
        );

        let row: TodoRow = query_as(&sql)
            .bind(*item.id.as_uuid())
            .bind(*item.owner_id.as_uuid())
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.is_completed)
            .bind(&item.context)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(from_row(row))
    }

    #[instrument(skip(self))]
    async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<TodoItem>, StorageError> {
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE owner_id = $1 ORDER BY created_at");
        let rows: Vec<TodoRow> = query_as(&sql)
            .bind(*owner.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        id: TodoId,
        owner: OwnerId,
    ) -> Result<Option<TodoItem>, StorageError> {
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE id = $1 AND owner_id = $2");
        let row: Option<TodoRow> = query_as(&sql)
            .bind(*id.as_uuid())
            .bind(*owner.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.map(from_row))
    }

    #[instrument(skip(self, patch))]
    async fn update_fields(
        &self,
        id: TodoId,
        owner: OwnerId,
        patch: &TodoPatch,
    ) -> Result<Option<TodoItem>, StorageError> {
        let sql = format!(
            "UPDATE todos SET title = COALESCE($3, title), description = COALESCE($4, description), \
             updated_at = $5 WHERE id = $1 AND owner_id = $2 RETURNING {COLUMNS}"
        );
        let row: Option<TodoRow> = query_as(&sql)
            .bind(*id.as_uuid())
            .bind(*owner.as_uuid())
            .bind(patch.title.as_deref())
            .bind(patch.description.as_deref())
            .bind(now_utc())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.map(from_row))
    }

    #[instrument(skip(self))]
    async fn toggle_completion(
        &self,
        id: TodoId,
        owner: OwnerId,
    ) -> Result<Option<TodoItem>, StorageError> {
        let sql = format!(
            "UPDATE todos SET is_completed = NOT is_completed, updated_at = $3 \
             WHERE id = $1 AND owner_id = $2 RETURNING {COLUMNS}"
        );
        let row: Option<TodoRow> = query_as(&sql)
            .bind(*id.as_uuid())
            .bind(*owner.as_uuid())
            .bind(now_utc())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.map(from_row))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: TodoId, owner: OwnerId) -> Result<bool, StorageError> {
        let result = query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
            .bind(*id.as_uuid())
            .bind(*owner.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(result.rows_affected() > 0)
    }
}

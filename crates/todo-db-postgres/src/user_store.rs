//! `UserStore` backed by the `users` table.

use async_trait::async_trait;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use todo_storage::{NewUser, OwnerId, StorageError, User, UserStore, now_utc};

use crate::error::{is_unique_violation, storage_err};

type UserRow = (Uuid, String, String, String, OffsetDateTime);

fn from_row((id, username, email, password_hash, created_at): UserRow) -> User {
    User {
        id: OwnerId::from_uuid(id),
        username,
        email,
        password_hash,
        created_at,
    }
}

/// PostgreSQL account store. Emails are unique case-insensitively.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Wraps an existing pool. Migrations must already be applied.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, new))]
    async fn create(&self, new: NewUser) -> Result<User, StorageError> {
        let email = new.email.trim().to_string();

        let row: UserRow = query_as(
            "INSERT INTO users (id, username, email, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&email)
        .bind(&new.password_hash)
        .bind(now_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::already_exists("User", email.clone())
            } else {
                storage_err(e)
            }
        })?;

        Ok(from_row(row))
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> = query_as(
            "SELECT id, username, email, password_hash, created_at \
             FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(from_row))
    }
}

//! Storage traits for the record store abstraction.
//!
//! This module defines the contracts every storage backend implements.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{NewTodo, NewUser, OwnerId, TodoId, TodoItem, TodoPatch, User};

/// Authoritative persistence of todo items.
///
/// Every lookup and mutation is scoped by both the item id and the owner id:
/// an id that exists but belongs to another owner behaves exactly like a
/// missing id. Implementations must be thread-safe (`Send + Sync`) and
/// provide atomic single-item updates.
///
/// # Example
///
/// ```ignore
/// use todo_storage::{OwnerId, StorageError, TodoId, TodoStore};
///
/// async fn finish(store: &dyn TodoStore, id: TodoId, owner: OwnerId) -> Result<bool, StorageError> {
///     Ok(store.toggle_completion(id, owner).await?.is_some())
/// }
/// ```
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Persists a new item, assigning its id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the item could not be persisted.
    async fn insert(&self, new: NewTodo) -> Result<TodoItem, StorageError>;

    /// Returns every item of `owner`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues; an owner without
    /// items yields an empty vector.
    async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<TodoItem>, StorageError>;

    /// Reads a single item scoped by owner.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn find_by_id(&self, id: TodoId, owner: OwnerId)
    -> Result<Option<TodoItem>, StorageError>;

    /// Updates the provided fields and refreshes `updated_at`.
    ///
    /// Returns the item after the update, or `None` when no item matches
    /// `(id, owner)`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn update_fields(
        &self,
        id: TodoId,
        owner: OwnerId,
        patch: &TodoPatch,
    ) -> Result<Option<TodoItem>, StorageError>;

    /// Atomically flips `is_completed` and refreshes `updated_at`.
    ///
    /// Returns the item after the flip, or `None` when no item matches
    /// `(id, owner)`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn toggle_completion(
        &self,
        id: TodoId,
        owner: OwnerId,
    ) -> Result<Option<TodoItem>, StorageError>;

    /// Removes an item. Returns `false` when no item matches `(id, owner)`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn delete(&self, id: TodoId, owner: OwnerId) -> Result<bool, StorageError>;
}

/// Persistence of registered accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the email is already registered.
    async fn create(&self, new: NewUser) -> Result<User, StorageError>;

    /// Looks an account up by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
}

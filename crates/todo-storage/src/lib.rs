//! # todo-storage
//!
//! Record store abstraction for the todo server.
//!
//! This crate defines the traits and types that every storage backend must
//! implement. It does not contain any implementations - those are provided by
//! `todo-db-memory` and `todo-db-postgres`.
//!
//! ## Overview
//!
//! The main trait is [`TodoStore`], the authoritative persistence of todo
//! items. Every lookup and mutation is scoped by `(TodoId, OwnerId)` so one
//! owner can never observe or change another owner's items.
//!
//! [`UserStore`] persists registered accounts for the login flow.
//!
//! ## Example
//!
//! ```ignore
//! use todo_storage::{OwnerId, StorageError, TodoItem, TodoStore};
//!
//! async fn open_items(
//!     store: &dyn TodoStore,
//!     owner: OwnerId,
//! ) -> Result<Vec<TodoItem>, StorageError> {
//!     let items = store.find_by_owner(owner).await?;
//!     Ok(items.into_iter().filter(|t| !t.is_completed).collect())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{TodoStore, UserStore};
pub use types::{
    IdParseError, NewTodo, NewUser, OwnerId, TodoId, TodoItem, TodoPatch, User, now_utc,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shareable todo store handle.
pub type DynTodoStore = std::sync::Arc<dyn TodoStore>;

/// Shareable user store handle.
pub type DynUserStore = std::sync::Arc<dyn UserStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use todo_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::{TodoStore, UserStore};
    pub use crate::types::{NewTodo, NewUser, OwnerId, TodoId, TodoItem, TodoPatch, User};
    pub use crate::{DynTodoStore, DynUserStore, StorageResult};
}

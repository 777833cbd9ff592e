//! In-memory record store backend for the todo server.
//!
//! This crate provides in-memory implementations of the `TodoStore` and
//! `UserStore` traits from `todo-storage`, using papaya lock-free HashMaps
//! for concurrent access. It backs the default `storage.backend = "memory"`
//! configuration and the HTTP integration tests.
//!
//! # Example
//!
//! ```ignore
//! use todo_db_memory::InMemoryTodoStore;
//! use todo_storage::{NewTodo, OwnerId, TodoStore};
//!
//! let store = InMemoryTodoStore::new();
//! let owner = OwnerId::new();
//! let item = store
//!     .insert(NewTodo {
//!         owner_id: owner,
//!         title: "write docs".into(),
//!         description: String::new(),
//!         context: "work".into(),
//!     })
//!     .await?;
//! ```

mod storage;
mod todo_impl;
mod user_impl;

pub use storage::{InMemoryTodoStore, InMemoryUserStore, TodoKey};

// Re-export the store traits for convenience
pub use todo_storage::{StorageError, TodoStore, UserStore};

/// Creates a new shareable in-memory todo store.
pub fn create_todo_store() -> todo_storage::DynTodoStore {
    std::sync::Arc::new(InMemoryTodoStore::new())
}

/// Creates a new shareable in-memory user store.
pub fn create_user_store() -> todo_storage::DynUserStore {
    std::sync::Arc::new(InMemoryUserStore::new())
}

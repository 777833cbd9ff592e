//! HTTP handlers.

pub mod accounts;
pub mod health;
pub mod todos;

pub use accounts::{login, signup};
pub use health::{healthz, metrics, readyz};
pub use todos::{create_todo, delete_todo, get_todo, list_todos, toggle_todo, update_todo};

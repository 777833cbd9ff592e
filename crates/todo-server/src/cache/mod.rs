//! Two-tier caching for per-owner todo lists.
//!
//! ```text
//! GET /api/todos → L1 (DashMap) → L2 (Redis, optional) → record store
//! ```
//!
//! If Redis is disabled or unreachable at startup the backend runs L1-only.
//! Entries are never authoritative; see [`TodoListCache`].

pub mod backend;
pub mod todo_list;

pub use backend::{CacheBackend, CacheStats, CachedEntry};
pub use todo_list::TodoListCache;

use papaya::HashMap as PapayaHashMap;
use std::sync::Arc;
use todo_storage::{OwnerId, TodoId, TodoItem, User};

/// Items are keyed by owner first so every lookup is owner-scoped by construction.
pub type TodoKey = (OwnerId, TodoId);

/// In-memory todo store using papaya lock-free HashMap.
///
/// Single-item updates go through `papaya::HashMap::update`, which applies
/// the closure atomically against the current value.
#[derive(Debug, Default)]
pub struct InMemoryTodoStore {
    pub(crate) data: Arc<PapayaHashMap<TodoKey, TodoItem>>,
}

impl InMemoryTodoStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
        }
    }

    /// Number of stored items across all owners.
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory user store keyed by normalized email.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    pub(crate) users: Arc<PapayaHashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(PapayaHashMap::new()),
        }
    }

    pub(crate) fn normalize_email(email: &str) -> String {
        email.trim().to_ascii_lowercase()
    }
}

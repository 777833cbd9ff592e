//! Todo operations: apply every change to the record store first, then
//! reconcile the owner's cached list with the store's confirmed result.
//!
//! The cache never decides an outcome. A store failure or a missing item
//! returns before the cache is touched, and cache problems only cost
//! freshness until the next miss or TTL expiry.

use std::sync::Arc;

use todo_storage::{DynTodoStore, NewTodo, OwnerId, TodoId, TodoItem, TodoPatch};

use crate::cache::TodoListCache;
use crate::error::ApiError;

/// Input for [`TodoService::create`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub context: String,
}

/// Result of a list read.
#[derive(Debug, Clone)]
pub struct TodoList {
    pub items: Vec<TodoItem>,
    /// Served from the cache without touching the store.
    pub cached: bool,
}

/// Coordinates the record store and the list cache.
#[derive(Clone)]
pub struct TodoService {
    store: DynTodoStore,
    cache: Arc<TodoListCache>,
}

impl TodoService {
    pub fn new(store: DynTodoStore, cache: Arc<TodoListCache>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &TodoListCache {
        &self.cache
    }

    #[tracing::instrument(skip(self, input), fields(owner = %owner))]
    pub async fn create(&self, owner: OwnerId, input: CreateTodo) -> Result<TodoItem, ApiError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(ApiError::validation("Title is required"));
        }

        let item = self
            .store
            .insert(NewTodo {
                owner_id: owner,
                title: title.to_string(),
                description: input.description,
                context: input.context,
            })
            .await?;

        let appended = item.clone();
        self.cache
            .mutate_in_place(owner, move |items| {
                items.retain(|t| t.id != appended.id);
                items.push(appended);
            })
            .await;

        tracing::debug!(todo = %item.id, "todo created");
        Ok(item)
    }

    /// Reads the owner's list, cache first.
    #[tracing::instrument(skip(self), fields(owner = %owner))]
    pub async fn list(&self, owner: OwnerId) -> Result<TodoList, ApiError> {
        if let Some(items) = self.cache.get(owner).await {
            tracing::debug!(count = items.len(), "todo list served from cache");
            return Ok(TodoList {
                items,
                cached: true,
            });
        }

        let items = self.store.find_by_owner(owner).await?;
        self.cache.put(owner, &items).await;
        Ok(TodoList {
            items,
            cached: false,
        })
    }

    /// Reads a single item straight from the store.
    pub async fn get(&self, id: TodoId, owner: OwnerId) -> Result<TodoItem, ApiError> {
        self.store
            .find_by_id(id, owner)
            .await?
            .ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self, patch), fields(owner = %owner, todo = %id))]
    pub async fn update(
        &self,
        id: TodoId,
        owner: OwnerId,
        mut patch: TodoPatch,
    ) -> Result<TodoItem, ApiError> {
        if let Some(title) = patch.title.as_mut() {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(ApiError::validation("Title must not be blank"));
            }
            *title = trimmed.to_string();
        }

        let item = self
            .store
            .update_fields(id, owner, &patch)
            .await?
            .ok_or_else(not_found)?;

        self.replace_cached(owner, &item).await;
        Ok(item)
    }

    /// Flips completion. The returned item carries the new value.
    #[tracing::instrument(skip(self), fields(owner = %owner, todo = %id))]
    pub async fn toggle(&self, id: TodoId, owner: OwnerId) -> Result<TodoItem, ApiError> {
        let item = self
            .store
            .toggle_completion(id, owner)
            .await?
            .ok_or_else(not_found)?;

        self.replace_cached(owner, &item).await;
        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(owner = %owner, todo = %id))]
    pub async fn delete(&self, id: TodoId, owner: OwnerId) -> Result<(), ApiError> {
        if !self.store.delete(id, owner).await? {
            return Err(not_found());
        }

        self.cache
            .mutate_in_place(owner, |items| items.retain(|t| t.id != id))
            .await;
        Ok(())
    }

    async fn replace_cached(&self, owner: OwnerId, item: &TodoItem) {
        let confirmed = item.clone();
        self.cache
            .mutate_in_place(owner, move |items| {
                match items.iter_mut().find(|t| t.id == confirmed.id) {
                    Some(slot) => *slot = confirmed,
                    // Entry predates the item; the store is authoritative.
                    None => items.push(confirmed),
                }
            })
            .await;
    }
}

fn not_found() -> ApiError {
    ApiError::not_found("Todo not found")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use todo_db_memory::InMemoryTodoStore;
    use todo_storage::{StorageError, TodoStore};

    use super::*;
    use crate::cache::CacheBackend;

    /// Counts `find_by_owner` calls to observe cache hits.
    struct CountingStore {
        inner: InMemoryTodoStore,
        lists: AtomicUsize,
        fail: std::sync::atomic::AtomicBool,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: InMemoryTodoStore::new(),
                lists: AtomicUsize::new(0),
                fail: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn check(&self) -> Result<(), StorageError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(StorageError::connection_error("store offline"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TodoStore for CountingStore {
        async fn insert(&self, new: NewTodo) -> Result<TodoItem, StorageError> {
            self.check()?;
            self.inner.insert(new).await
        }
        async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<TodoItem>, StorageError> {
            self.check()?;
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_owner(owner).await
        }
        async fn find_by_id(
            &self,
            id: TodoId,
            owner: OwnerId,
        ) -> Result<Option<TodoItem>, StorageError> {
            self.check()?;
            self.inner.find_by_id(id, owner).await
        }
        async fn update_fields(
            &self,
            id: TodoId,
            owner: OwnerId,
            patch: &TodoPatch,
        ) -> Result<Option<TodoItem>, StorageError> {
            self.check()?;
            self.inner.update_fields(id, owner, patch).await
        }
        async fn toggle_completion(
            &self,
            id: TodoId,
            owner: OwnerId,
        ) -> Result<Option<TodoItem>, StorageError> {
            self.check()?;
            self.inner.toggle_completion(id, owner).await
        }
        async fn delete(&self, id: TodoId, owner: OwnerId) -> Result<bool, StorageError> {
            self.check()?;
            self.inner.delete(id, owner).await
        }
    }

    fn service(ttl: Duration) -> (TodoService, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::new());
        let cache = Arc::new(TodoListCache::new(CacheBackend::new_local(), ttl));
        (TodoService::new(store.clone(), cache), store)
    }

    fn input(title: &str) -> CreateTodo {
        CreateTodo {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_toggle_example() {
        let (svc, _) = service(Duration::from_secs(60));
        let owner = OwnerId::new();

        let item = svc.create(owner, input("a")).await.unwrap();
        assert_eq!(item.created_at, item.updated_at);
        assert!(!item.is_completed);

        assert!(svc.toggle(item.id, owner).await.unwrap().is_completed);
        assert!(!svc.toggle(item.id, owner).await.unwrap().is_completed);
    }

    #[tokio::test]
    async fn test_list_miss_then_hit() {
        let (svc, store) = service(Duration::from_secs(60));
        let owner = OwnerId::new();
        svc.create(owner, input("a")).await.unwrap();

        let first = svc.list(owner).await.unwrap();
        assert!(!first.cached);
        let second = svc.list(owner).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.items, first.items);
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mutations_reconcile_primed_cache() {
        let (svc, store) = service(Duration::from_secs(60));
        let owner = OwnerId::new();
        let a = svc.create(owner, input("a")).await.unwrap();
        svc.list(owner).await.unwrap();

        let b = svc.create(owner, input("b")).await.unwrap();
        let patch = TodoPatch {
            title: Some("a2".into()),
            description: None,
        };
        svc.update(a.id, owner, patch).await.unwrap();
        svc.toggle(b.id, owner).await.unwrap();

        let list = svc.list(owner).await.unwrap();
        assert!(list.cached);
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);

        let mut from_store = store.inner.find_by_owner(owner).await.unwrap();
        let mut from_cache = list.items;
        from_store.sort_by_key(|t| t.id);
        from_cache.sort_by_key(|t| t.id);
        assert_eq!(from_cache, from_store);

        svc.delete(a.id, owner).await.unwrap();
        let list = svc.list(owner).await.unwrap();
        assert!(list.cached);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].id, b.id);
    }

    #[tokio::test]
    async fn test_delete_last_item_clears_entry() {
        let (svc, store) = service(Duration::from_secs(60));
        let owner = OwnerId::new();
        let a = svc.create(owner, input("a")).await.unwrap();
        svc.list(owner).await.unwrap();

        svc.delete(a.id, owner).await.unwrap();
        let list = svc.list(owner).await.unwrap();
        assert!(!list.cached);
        assert!(list.items.is_empty());
        assert_eq!(store.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_foreign_owner_is_not_found_and_cache_untouched() {
        let (svc, _) = service(Duration::from_secs(60));
        let owner = OwnerId::new();
        let intruder = OwnerId::new();
        let a = svc.create(owner, input("a")).await.unwrap();
        let before = svc.list(owner).await.unwrap().items;

        assert!(matches!(
            svc.toggle(a.id, intruder).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete(a.id, intruder).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            svc.update(a.id, intruder, TodoPatch::default()).await,
            Err(ApiError::NotFound(_))
        ));

        let after = svc.list(owner).await.unwrap();
        assert!(after.cached);
        assert_eq!(after.items, before);
        assert_eq!(svc.get(a.id, owner).await.unwrap(), a);
    }

    #[tokio::test]
    async fn test_store_failure_is_storage_error_and_cache_untouched() {
        let (svc, store) = service(Duration::from_secs(60));
        let owner = OwnerId::new();
        let a = svc.create(owner, input("a")).await.unwrap();
        let cached = svc.list(owner).await.unwrap().items;

        store.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            svc.toggle(a.id, owner).await,
            Err(ApiError::Storage(_))
        ));
        assert!(matches!(
            svc.create(owner, input("b")).await,
            Err(ApiError::Storage(_))
        ));

        assert_eq!(svc.cache().get(owner).await, Some(cached));
    }

    #[tokio::test]
    async fn test_list_store_failure_on_miss() {
        let (svc, store) = service(Duration::from_secs(60));
        store.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            svc.list(OwnerId::new()).await,
            Err(ApiError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_ttl_expiry_falls_back_to_store() {
        let (svc, store) = service(Duration::from_millis(50));
        let owner = OwnerId::new();
        svc.create(owner, input("a")).await.unwrap();

        assert!(!svc.list(owner).await.unwrap().cached);
        assert!(svc.list(owner).await.unwrap().cached);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!svc.list(owner).await.unwrap().cached);
        assert_eq!(store.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_title_rejected_before_store() {
        let (svc, store) = service(Duration::from_secs(60));
        let owner = OwnerId::new();
        assert!(matches!(
            svc.create(owner, input("   ")).await,
            Err(ApiError::Validation(_))
        ));
        assert!(store.inner.is_empty());

        let a = svc.create(owner, input("a")).await.unwrap();
        let patch = TodoPatch {
            title: Some(" ".into()),
            description: None,
        };
        assert!(matches!(
            svc.update(a.id, owner, patch).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_is_immutable() {
        let (svc, _) = service(Duration::from_secs(60));
        let owner = OwnerId::new();
        let a = svc.create(owner, input("a")).await.unwrap();
        let patch = TodoPatch {
            title: Some("b".into()),
            description: Some("c".into()),
        };
        assert_eq!(svc.update(a.id, owner, patch).await.unwrap().owner_id, owner);
        assert_eq!(svc.toggle(a.id, owner).await.unwrap().owner_id, owner);
    }
}

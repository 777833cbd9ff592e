//! Per-owner todo list cache.
//!
//! ## Cache Key Format
//!
//! `todos:{owner_id}`, holding the owner's full list as MessagePack.
//!
//! The cache is a disposable projection of the record store. Every operation
//! is best-effort: a failure is logged and only affects freshness.

use std::time::Duration;

use time::OffsetDateTime;
use todo_storage::{OwnerId, TodoId, TodoItem};

use super::backend::CacheBackend;

/// Cached item serialized as MessagePack. Timestamps are unix microseconds.
#[derive(serde::Serialize, serde::Deserialize)]
struct CachedTodo {
    id: TodoId,
    owner_id: OwnerId,
    title: String,
    description: String,
    is_completed: bool,
    context: String,
    created_at_us: i64,
    updated_at_us: i64,
}

fn to_micros(ts: OffsetDateTime) -> i64 {
    i64::try_from(ts.unix_timestamp_nanos() / 1_000).unwrap_or(i64::MAX)
}

fn from_micros(us: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(us) * 1_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

impl CachedTodo {
    fn from_item(item: &TodoItem) -> Self {
        Self {
            id: item.id,
            owner_id: item.owner_id,
            title: item.title.clone(),
            description: item.description.clone(),
            is_completed: item.is_completed,
            context: item.context.clone(),
            created_at_us: to_micros(item.created_at),
            updated_at_us: to_micros(item.updated_at),
        }
    }

    fn into_item(self) -> TodoItem {
        TodoItem {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            is_completed: self.is_completed,
            context: self.context,
            created_at: from_micros(self.created_at_us),
            updated_at: from_micros(self.updated_at_us),
        }
    }
}

/// Read-through cache of each owner's todo list.
#[derive(Clone)]
pub struct TodoListCache {
    backend: CacheBackend,
    ttl: Duration,
}

impl TodoListCache {
    /// Create a new list cache with the given backend and default TTL.
    pub fn new(backend: CacheBackend, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    #[inline]
    fn cache_key(owner: OwnerId) -> String {
        format!("todos:{owner}")
    }

    /// Returns the owner's cached list if present and unexpired.
    ///
    /// An entry that fails to decode counts as a miss and is removed.
    pub async fn get(&self, owner: OwnerId) -> Option<Vec<TodoItem>> {
        let key = Self::cache_key(owner);
        let data = self.backend.get(&key).await?;
        match rmp_serde::from_slice::<Vec<CachedTodo>>(&data) {
            Ok(cached) => Some(cached.into_iter().map(CachedTodo::into_item).collect()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to deserialize cached todo list");
                self.backend.invalidate(&key).await;
                None
            }
        }
    }

    /// Overwrites the owner's entry using the default TTL.
    pub async fn put(&self, owner: OwnerId, items: &[TodoItem]) {
        self.put_with_ttl(owner, items, self.ttl).await;
    }

    /// Overwrites the owner's entry.
    pub async fn put_with_ttl(&self, owner: OwnerId, items: &[TodoItem], ttl: Duration) {
        let key = Self::cache_key(owner);
        let cached: Vec<CachedTodo> = items.iter().map(CachedTodo::from_item).collect();
        match rmp_serde::to_vec(&cached) {
            Ok(data) => self.backend.set(&key, data, ttl).await,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize todo list for cache");
            }
        }
    }

    /// Removes the owner's entry.
    pub async fn invalidate(&self, owner: OwnerId) {
        self.backend.invalidate(&Self::cache_key(owner)).await;
    }

    /// Applies `mutator` to the cached list and writes it back with a fresh
    /// TTL. Does nothing when the owner has no cached list. A list left empty
    /// is removed rather than rewritten.
    ///
    /// Returns `true` if a cached entry was updated or removed.
    pub async fn mutate_in_place<F>(&self, owner: OwnerId, mutator: F) -> bool
    where
        F: FnOnce(&mut Vec<TodoItem>),
    {
        let Some(mut items) = self.get(owner).await else {
            return false;
        };
        mutator(&mut items);
        if items.is_empty() {
            self.invalidate(owner).await;
        } else {
            self.put(owner, &items).await;
        }
        true
    }

    /// Default TTL applied by [`put`](Self::put).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Underlying byte-level backend.
    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_storage::{NewTodo, now_utc};

    fn item(owner: OwnerId, title: &str) -> TodoItem {
        TodoItem::create(
            NewTodo {
                owner_id: owner,
                title: title.into(),
                description: "d".into(),
                context: "work".into(),
            },
            now_utc(),
        )
    }

    fn cache() -> TodoListCache {
        TodoListCache::new(CacheBackend::new_local(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_put_then_get_preserves_items() {
        let cache = cache();
        let owner = OwnerId::new();
        let items = vec![item(owner, "a"), item(owner, "b")];

        cache.put(owner, &items).await;
        assert_eq!(cache.get(owner).await, Some(items));
        assert_eq!(cache.get(OwnerId::new()).await, None);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss_and_removed() {
        let cache = cache();
        let owner = OwnerId::new();
        let key = TodoListCache::cache_key(owner);
        cache
            .backend()
            .set(&key, b"\xc1not msgpack".to_vec(), Duration::from_secs(60))
            .await;

        assert_eq!(cache.get(owner).await, None);
        assert_eq!(cache.backend().stats().l1_entries, 0);
    }

    #[tokio::test]
    async fn test_mutate_in_place_noop_when_absent() {
        let cache = cache();
        let owner = OwnerId::new();
        let touched = cache
            .mutate_in_place(owner, |items| items.push(item(owner, "x")))
            .await;
        assert!(!touched);
        assert_eq!(cache.get(owner).await, None);
    }

    #[tokio::test]
    async fn test_mutate_in_place_rewrites_and_removes_when_empty() {
        let cache = cache();
        let owner = OwnerId::new();
        let first = item(owner, "a");
        cache.put(owner, std::slice::from_ref(&first)).await;

        let second = item(owner, "b");
        let pushed = second.clone();
        assert!(cache.mutate_in_place(owner, move |items| items.push(pushed)).await);
        assert_eq!(cache.get(owner).await.map(|v| v.len()), Some(2));

        assert!(cache.mutate_in_place(owner, |items| items.clear()).await);
        assert_eq!(cache.get(owner).await, None);
        assert_eq!(cache.backend().stats().l1_entries, 0);
    }

    #[tokio::test]
    async fn test_put_with_ttl_expires() {
        let cache = cache();
        let owner = OwnerId::new();
        cache
            .put_with_ttl(owner, &[item(owner, "a")], Duration::from_millis(30))
            .await;
        assert!(cache.get(owner).await.is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get(owner).await.is_none());
    }

    #[test]
    fn test_micros_roundtrip() {
        let now = now_utc();
        assert_eq!(from_micros(to_micros(now)), now);
    }
}

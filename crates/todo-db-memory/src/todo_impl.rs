//! Implementation of the TodoStore trait for InMemoryTodoStore.

use async_trait::async_trait;

use todo_storage::{
    NewTodo, OwnerId, StorageError, TodoId, TodoItem, TodoPatch, TodoStore, now_utc,
};

use crate::storage::InMemoryTodoStore;

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn insert(&self, new: NewTodo) -> Result<TodoItem, StorageError> {
        let item = TodoItem::create(new, now_utc());
        let guard = self.data.pin();
        guard.insert((item.owner_id, item.id), item.clone());
        tracing::trace!(id = %item.id, owner = %item.owner_id, "todo inserted");
        Ok(item)
    }

    async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<TodoItem>, StorageError> {
        let guard = self.data.pin();
        Ok(guard
            .iter()
            .filter(|((item_owner, _), _)| *item_owner == owner)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn find_by_id(
        &self,
        id: TodoId,
        owner: OwnerId,
    ) -> Result<Option<TodoItem>, StorageError> {
        let guard = self.data.pin();
        Ok(guard.get(&(owner, id)).cloned())
    }

    async fn update_fields(
        &self,
        id: TodoId,
        owner: OwnerId,
        patch: &TodoPatch,
    ) -> Result<Option<TodoItem>, StorageError> {
        let now = now_utc();
        let guard = self.data.pin();
        let updated = guard.update((owner, id), |current| {
            let mut next = current.clone();
            next.apply_patch(patch, now);
            next
        });
        Ok(updated.cloned())
    }

    async fn toggle_completion(
        &self,
        id: TodoId,
        owner: OwnerId,
    ) -> Result<Option<TodoItem>, StorageError> {
        let now = now_utc();
        let guard = self.data.pin();
        let updated = guard.update((owner, id), |current| {
            let mut next = current.clone();
            next.toggle(now);
            next
        });
        Ok(updated.cloned())
    }

    async fn delete(&self, id: TodoId, owner: OwnerId) -> Result<bool, StorageError> {
        let guard = self.data.pin();
        Ok(guard.remove(&(owner, id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_todo(owner: OwnerId, title: &str) -> NewTodo {
        NewTodo {
            owner_id: owner,
            title: title.to_string(),
            description: String::new(),
            context: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_owner() {
        let store = InMemoryTodoStore::new();
        let alice = OwnerId::new();
        let bob = OwnerId::new();

        let created = store.insert(new_todo(alice, "a")).await.unwrap();
        store.insert(new_todo(alice, "b")).await.unwrap();
        store.insert(new_todo(bob, "c")).await.unwrap();

        assert_eq!(created.created_at, created.updated_at);
        assert!(!created.is_completed);

        let items = store.find_by_owner(alice).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|t| t.owner_id == alice));

        assert!(store.find_by_owner(OwnerId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_fields_is_owner_scoped() {
        let store = InMemoryTodoStore::new();
        let alice = OwnerId::new();
        let item = store.insert(new_todo(alice, "a")).await.unwrap();

        let patch = TodoPatch {
            title: Some("stolen".into()),
            description: None,
        };
        let other = store
            .update_fields(item.id, OwnerId::new(), &patch)
            .await
            .unwrap();
        assert!(other.is_none());

        let unchanged = store.find_by_id(item.id, alice).await.unwrap().unwrap();
        assert_eq!(unchanged, item);

        let updated = store
            .update_fields(item.id, alice, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "stolen");
        assert_eq!(updated.owner_id, alice);
        assert!(updated.updated_at >= item.updated_at);
        assert_eq!(updated.created_at, item.created_at);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_completion() {
        let store = InMemoryTodoStore::new();
        let owner = OwnerId::new();
        let item = store.insert(new_todo(owner, "a")).await.unwrap();

        let first = store.toggle_completion(item.id, owner).await.unwrap().unwrap();
        assert!(first.is_completed);
        let second = store.toggle_completion(item.id, owner).await.unwrap().unwrap();
        assert!(!second.is_completed);

        assert!(
            store
                .toggle_completion(TodoId::new(), owner)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let store = InMemoryTodoStore::new();
        let owner = OwnerId::new();
        let item = store.insert(new_todo(owner, "a")).await.unwrap();

        assert!(!store.delete(item.id, OwnerId::new()).await.unwrap());
        assert_eq!(store.len(), 1);

        assert!(store.delete(item.id, owner).await.unwrap());
        assert!(store.is_empty());
        assert!(!store.delete(item.id, owner).await.unwrap());
    }
}

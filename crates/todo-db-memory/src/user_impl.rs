//! Implementation of the UserStore trait for InMemoryUserStore.

use async_trait::async_trait;

use todo_storage::{NewUser, OwnerId, StorageError, User, UserStore, now_utc};

use crate::storage::InMemoryUserStore;

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StorageError> {
        let key = Self::normalize_email(&new.email);
        let user = User {
            id: OwnerId::new(),
            username: new.username,
            email: new.email.trim().to_string(),
            password_hash: new.password_hash,
            created_at: now_utc(),
        };

        let guard = self.users.pin();
        match guard.try_insert(key, user.clone()) {
            Ok(_) => Ok(user),
            Err(_) => Err(StorageError::already_exists("User", user.email)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let guard = self.users.pin();
        Ok(guard.get(&Self::normalize_email(email)).cloned())
    }
}

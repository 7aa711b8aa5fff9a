//! In-process user store for development and tests.

use super::{StoreError, UserStore};
use crate::model::{NewUser, User};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

/// `UserStore` backed by a map. Ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user. Returns whether it existed.
    pub async fn remove(&self, id: i64) -> bool {
        self.inner.write().await.users.remove(&id).is_some()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.inner
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, user: NewUser) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(user.email));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.users.insert(id, user.with_id(id));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser::registration(email, "hash".to_string())
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryUserStore::new();
        assert_eq!(store.create(new_user("a@x.com")).await.unwrap(), 1);
        assert_eq!(store.create(new_user("b@x.com")).await.unwrap(), 2);

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].email, "a@x.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@x.com")).await.unwrap();

        assert!(matches!(
            store.create(new_user("a@x.com")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = MemoryUserStore::new();
        let id = store.create(new_user("a@x.com")).await.unwrap();

        assert_eq!(store.get_by_id(id).await.unwrap().email, "a@x.com");
        assert_eq!(store.get_by_email("a@x.com").await.unwrap().id, id);
        assert!(matches!(store.get_by_id(99).await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.get_by_email("b@x.com").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryUserStore::new();
        let id = store.create(new_user("a@x.com")).await.unwrap();

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(matches!(store.get_by_id(id).await, Err(StoreError::NotFound)));
    }
}

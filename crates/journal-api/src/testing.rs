//! Store doubles for tests

use crate::state::AppState;
use crate::test_config;
use async_trait::async_trait;
use journal_core::{
    CredentialStore, MemoryStore, NewUser, OwnershipPolicy, Result, User, UserId,
};
use std::sync::Arc;

/// Credential store whose existence check never sees a clash
///
/// Models a signup or rename that loses a race after the fast-path check
/// passed, so only the inner store's uniqueness guard can reject it.
pub struct StaleExistenceCheck {
    inner: Arc<MemoryStore>,
}

impl StaleExistenceCheck {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CredentialStore for StaleExistenceCheck {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        self.inner.insert_user(user).await
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn username_exists(&self, _username: &str) -> Result<bool> {
        Ok(false)
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>> {
        self.inner.update_user(user).await
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        self.inner.delete_user(id).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

/// Application state whose services only learn of a clash from the store
pub fn create_test_state_with_stale_check() -> Arc<AppState> {
    let store = Arc::new(MemoryStore::new());
    let credentials = Arc::new(StaleExistenceCheck::new(store.clone()));
    let state = AppState::new(test_config(OwnershipPolicy::default()), credentials, store)
        .expect("test configuration is valid");
    Arc::new(state)
}

//! In-memory store
//!
//! Every mutation takes the single write lock, which makes the
//! uniqueness check and the insert one atomic step.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{CredentialStore, JournalStore};
use crate::{
    Journal, JournalId, NewJournal, NewUser, Page, PageRequest, Result, StoreError, User, UserId,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    journals: BTreeMap<JournalId, Journal>,
    next_user_id: UserId,
    next_journal_id: JournalId,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.has_username(username))
    }
}

/// Process-local store for tests and development
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.username_taken(&user.username, None) {
            return Err(StoreError::DuplicateUsername);
        }

        tables.next_user_id += 1;
        let created = User {
            id: tables.next_user_id,
            name: user.name,
            username: user.username,
            password_hash: user.password_hash,
        };
        tables.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.has_username(username))
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.tables.read().await.username_taken(username, None))
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&user.id) {
            return Ok(None);
        }
        if tables.username_taken(&user.username, Some(user.id)) {
            return Err(StoreError::DuplicateUsername);
        }

        tables.users.insert(user.id, user.clone());
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.journals.retain(|_, j| j.owner_id != id);

        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn insert_journal(&self, journal: NewJournal) -> Result<Journal> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&journal.owner_id) {
            return Err(StoreError::UnknownOwner(journal.owner_id));
        }

        tables.next_journal_id += 1;
        let created = Journal {
            id: tables.next_journal_id,
            title: journal.title,
            message: journal.message,
            created_at: journal.created_at,
            last_modified_at: journal.created_at,
            owner_id: journal.owner_id,
        };
        tables.journals.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_journal(&self, id: JournalId) -> Result<Option<Journal>> {
        Ok(self.tables.read().await.journals.get(&id).cloned())
    }

    async fn list_journals_by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Journal>> {
        let tables = self.tables.read().await;

        let mut owned: Vec<&Journal> = tables
            .journals
            .values()
            .filter(|j| j.owner_id == owner_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = owned.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = owned
            .into_iter()
            .skip(offset)
            .take(page.size as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            request: page,
            total,
        })
    }

    async fn journal_ids_by_owner(&self, owner_id: UserId) -> Result<Vec<JournalId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .journals
            .values()
            .filter(|j| j.owner_id == owner_id)
            .map(|j| j.id)
            .collect())
    }

    async fn update_journal(&self, journal: &Journal) -> Result<Option<Journal>> {
        let mut tables = self.tables.write().await;

        let Some(stored) = tables.journals.get_mut(&journal.id) else {
            return Ok(None);
        };
        stored.title = journal.title.clone();
        stored.message = journal.message.clone();
        stored.last_modified_at = journal.last_modified_at;

        Ok(Some(stored.clone()))
    }

    async fn delete_journal(&self, id: JournalId) -> Result<bool> {
        Ok(self.tables.write().await.journals.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    async fn user(store: &MemoryStore, username: &str) -> User {
        store
            .insert_user(NewUser::new(None, username, "hash"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_username_unique_case_insensitive() {
        let store = MemoryStore::new();
        user(&store, "alice").await;

        let result = store.insert_user(NewUser::new(None, "ALICE", "hash")).await;
        assert!(matches!(result, Err(StoreError::DuplicateUsername)));

        assert!(store.username_exists("Alice").await.unwrap());
        let found = store.find_user_by_username("aLiCe").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_username() {
        let store = MemoryStore::new();
        user(&store, "alice").await;
        let mut bob = user(&store, "bobby").await;

        bob.username = "Alice".to_string();
        let result = store.update_user(&bob).await;
        assert!(matches!(result, Err(StoreError::DuplicateUsername)));

        // Changing only the case of one's own username is allowed
        bob.username = "BOBBY".to_string();
        let updated = store.update_user(&bob).await.unwrap().unwrap();
        assert_eq!(updated.username, "BOBBY");
    }

    #[tokio::test]
    async fn test_listing_is_scoped_and_ordered() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bobby").await;

        let same_instant = Utc::now();
        let older = same_instant - Duration::minutes(5);

        let first = store
            .insert_journal(NewJournal::new(alice.id, "a1", "m").created_at(same_instant))
            .await
            .unwrap();
        let second = store
            .insert_journal(NewJournal::new(alice.id, "a2", "m").created_at(same_instant))
            .await
            .unwrap();
        let oldest = store
            .insert_journal(NewJournal::new(alice.id, "a0", "m").created_at(older))
            .await
            .unwrap();
        store
            .insert_journal(NewJournal::new(bob.id, "b1", "m"))
            .await
            .unwrap();

        let page = store
            .list_journals_by_owner(alice.id, PageRequest::new(0, 10))
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|j| j.id).collect();

        assert_eq!(page.total, 3);
        assert_eq!(ids, vec![second.id, first.id, oldest.id]);

        let second_page = store
            .list_journals_by_owner(alice.id, PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(second_page.items.len(), 1);
        assert_eq!(second_page.items[0].id, oldest.id);
        assert_eq!(second_page.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_insert_journal_requires_owner() {
        let store = MemoryStore::new();
        let result = store.insert_journal(NewJournal::new(42, "t", "m")).await;
        assert!(matches!(result, Err(StoreError::UnknownOwner(42))));
    }

    #[tokio::test]
    async fn test_update_journal_keeps_owner() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bobby").await;

        let mut journal = store
            .insert_journal(NewJournal::new(alice.id, "t", "m"))
            .await
            .unwrap();
        journal.title = "new".to_string();
        journal.owner_id = bob.id;

        let updated = store.update_journal(&journal).await.unwrap().unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.owner_id, alice.id);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bobby").await;

        let a = store
            .insert_journal(NewJournal::new(alice.id, "t", "m"))
            .await
            .unwrap();
        let b = store
            .insert_journal(NewJournal::new(bob.id, "t", "m"))
            .await
            .unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(!store.delete_user(alice.id).await.unwrap());

        assert!(store.find_journal(a.id).await.unwrap().is_none());
        assert!(store.find_journal(b.id).await.unwrap().is_some());
        assert_eq!(store.journal_ids_by_owner(bob.id).await.unwrap(), vec![b.id]);
    }
}

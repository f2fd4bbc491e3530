//! Persistence traits for users and journals
//!
//! Two backends implement them: [`MemoryStore`] for tests and single-process
//! development, and [`PgStore`] backed by PostgreSQL. Both enforce username
//! uniqueness themselves, so the application-level check in the services is
//! only a fast path.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{Journal, JournalId, NewJournal, NewUser, Page, PageRequest, Result, User, UserId};
use async_trait::async_trait;

/// User credential storage
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user; fails with `DuplicateUsername` on a case-insensitive clash
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Case-insensitive username lookup
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Case-insensitive existence check
    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Persist name, username and password hash of an existing user
    async fn update_user(&self, user: &User) -> Result<Option<User>>;

    /// Delete a user together with every journal they own
    async fn delete_user(&self, id: UserId) -> Result<bool>;

    /// Cheap connectivity probe for readiness checks
    async fn ping(&self) -> Result<()>;
}

/// Journal storage
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Insert a journal; fails with `UnknownOwner` if the owner is missing
    async fn insert_journal(&self, journal: NewJournal) -> Result<Journal>;

    async fn find_journal(&self, id: JournalId) -> Result<Option<Journal>>;

    /// One page of an owner's journals, newest first, ties broken by id descending
    async fn list_journals_by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Journal>>;

    /// Ids of all journals owned by a user, ascending
    async fn journal_ids_by_owner(&self, owner_id: UserId) -> Result<Vec<JournalId>>;

    /// Persist title, message and last-modified time; the owner is never written
    async fn update_journal(&self, journal: &Journal) -> Result<Option<Journal>>;

    async fn delete_journal(&self, id: JournalId) -> Result<bool>;
}

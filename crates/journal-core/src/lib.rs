//! Journal Core - Domain models, storage traits, and shared types
//!
//! This crate defines the core abstractions used by the journal backend:
//! - User and Journal models
//! - Storage errors
//! - Credential and journal store traits with in-memory and PostgreSQL backends
//! - Pagination primitives
//! - Configuration management

pub mod config;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, OwnershipPolicy};
pub use store::{CredentialStore, JournalStore, MemoryStore, PgStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the storage layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique-username constraint was violated
    #[error("username already exists")]
    DuplicateUsername,

    /// A journal referenced an owner that does not exist
    #[error("owner {0} does not exist")]
    UnknownOwner(UserId),

    #[error("Database error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Identity
// ============================================================================

/// Numeric user identifier, assigned by the store
pub type UserId = i64;

/// Numeric journal identifier, assigned by the store
pub type JournalId = i64;

/// Maximum username length accepted by the store
pub const USERNAME_MAX_LEN: usize = 50;

/// A registered user
///
/// `password_hash` holds a PHC-formatted hash, never the raw password.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub username: String,
    pub password_hash: String,
}

impl User {
    /// Case-insensitive username comparison
    pub fn has_username(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.to_lowercase()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// User fields required for insertion
#[derive(Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub username: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(
        name: Option<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name,
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}

// ============================================================================
// Journals
// ============================================================================

/// A journal entry owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub id: JournalId,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    /// Owning user; fixed at creation
    pub owner_id: UserId,
}

/// Journal fields required for insertion
#[derive(Debug, Clone)]
pub struct NewJournal {
    pub title: String,
    pub message: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl NewJournal {
    /// Create a journal stamped with the current UTC time
    pub fn new(owner_id: UserId, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            owner_id,
            created_at: Utc::now(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;
    pub const MAX_SIZE: u32 = 100;

    /// Build a page request, clamping `size` to `1..=MAX_SIZE`
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results together with the total row count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub request: PageRequest,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.request.size);
        self.total.div_ceil(size)
    }
}

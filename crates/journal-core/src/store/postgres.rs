//! PostgreSQL store
//!
//! Username uniqueness is enforced by a unique index on `lower(username)`;
//! journals reference their owner with `ON DELETE CASCADE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use super::{CredentialStore, JournalStore};
use crate::{
    Journal, JournalId, NewJournal, NewUser, Page, PageRequest, Result, StoreError, User, UserId,
};

/// Idempotent table bootstrap, executed one statement at a time
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255),
        username VARCHAR(50) NOT NULL,
        password VARCHAR(255) NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_users_username ON users (lower(username))",
    r#"
    CREATE TABLE IF NOT EXISTS journals (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        message TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        last_modified_at TIMESTAMPTZ NOT NULL,
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_journals_owner_created ON journals (user_id, created_at DESC, id DESC)",
];

/// PostgreSQL-backed user and journal store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn bootstrap_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Schema bootstrap failed: {e}")))?;
        }
        tracing::info!("database schema ready");
        Ok(())
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: Option<String>,
    username: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            username: row.username,
            password_hash: row.password,
        }
    }
}

/// Journal row from database
#[derive(Debug, FromRow)]
struct JournalRow {
    id: i64,
    title: String,
    message: String,
    created_at: DateTime<Utc>,
    last_modified_at: DateTime<Utc>,
    user_id: i64,
}

impl From<JournalRow> for Journal {
    fn from(row: JournalRow) -> Self {
        Journal {
            id: row.id,
            title: row.title,
            message: row.message,
            created_at: row.created_at,
            last_modified_at: row.last_modified_at,
            owner_id: row.user_id,
        }
    }
}

/// Map driver errors, translating constraint violations into typed errors
fn map_write_error(context: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateUsername;
        }
    }
    StoreError::Database(format!("{context}: {err}"))
}

fn map_db_error(context: &str, err: sqlx::Error) -> StoreError {
    StoreError::Database(format!("{context}: {err}"))
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (name, username, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, username, password
            "#,
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to create user", e))?;

        Ok(row.into())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, username, password FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("Failed to fetch user", e))?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, username, password FROM users WHERE lower(username) = lower($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to fetch user", e))?;

        Ok(row.map(User::from))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(username) = lower($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to check username", e))?;

        Ok(exists)
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users SET name = $2, username = $3, password = $4
            WHERE id = $1
            RETURNING id, name, username, password
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to update user", e))?;

        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Database ping failed", e))?;
        Ok(())
    }
}

#[async_trait]
impl JournalStore for PgStore {
    async fn insert_journal(&self, journal: NewJournal) -> Result<Journal> {
        let row: JournalRow = sqlx::query_as(
            r#"
            INSERT INTO journals (title, message, created_at, last_modified_at, user_id)
            VALUES ($1, $2, $3, $3, $4)
            RETURNING id, title, message, created_at, last_modified_at, user_id
            "#,
        )
        .bind(&journal.title)
        .bind(&journal.message)
        .bind(journal.created_at)
        .bind(journal.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::UnknownOwner(journal.owner_id)
            } else {
                map_db_error("Failed to create journal", e)
            }
        })?;

        Ok(row.into())
    }

    async fn find_journal(&self, id: JournalId) -> Result<Option<Journal>> {
        let row: Option<JournalRow> = sqlx::query_as(
            r#"
            SELECT id, title, message, created_at, last_modified_at, user_id
            FROM journals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to get journal", e))?;

        Ok(row.map(Journal::from))
    }

    async fn list_journals_by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Journal>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM journals WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to count journals", e))?;

        let rows: Vec<JournalRow> = sqlx::query_as(
            r#"
            SELECT id, title, message, created_at, last_modified_at, user_id
            FROM journals
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(i64::from(page.size))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list journals", e))?;

        Ok(Page {
            items: rows.into_iter().map(Journal::from).collect(),
            request: page,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn journal_ids_by_owner(&self, owner_id: UserId) -> Result<Vec<JournalId>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM journals WHERE user_id = $1 ORDER BY id")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_db_error("Failed to list journal ids", e))?;

        Ok(ids)
    }

    async fn update_journal(&self, journal: &Journal) -> Result<Option<Journal>> {
        let row: Option<JournalRow> = sqlx::query_as(
            r#"
            UPDATE journals SET
                title = $2,
                message = $3,
                last_modified_at = $4
            WHERE id = $1
            RETURNING id, title, message, created_at, last_modified_at, user_id
            "#,
        )
        .bind(journal.id)
        .bind(&journal.title)
        .bind(&journal.message)
        .bind(journal.last_modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to update journal", e))?;

        Ok(row.map(Journal::from))
    }

    async fn delete_journal(&self, id: JournalId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM journals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete journal", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let journal: Journal = JournalRow {
            id: 7,
            title: "t".to_string(),
            message: "m".to_string(),
            created_at: now,
            last_modified_at: now,
            user_id: 3,
        }
        .into();
        assert_eq!(journal.owner_id, 3);

        let user: User = UserRow {
            id: 3,
            name: None,
            username: "alice".to_string(),
            password: "hash".to_string(),
        }
        .into();
        assert_eq!(user.password_hash, "hash");
    }

    #[test]
    fn test_schema_enforces_uniqueness_and_cascade() {
        let ddl = SCHEMA.join("\n");
        assert!(ddl.contains("UNIQUE INDEX IF NOT EXISTS ux_users_username ON users (lower(username))"));
        assert!(ddl.contains("ON DELETE CASCADE"));
    }
}

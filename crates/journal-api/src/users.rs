//! Account management
//!
//! Every operation takes the caller explicitly. The `/me` variants act on the
//! caller's own account; the by-id variants are limited to the account owner
//! and to administrators.

use crate::audit::{audit_log, AuditEvent};
use crate::auth::{
    middleware::CallerIdentity,
    models::{UserRequest, UserResponse},
    ownership::OwnershipGuard,
    password::PasswordHasher,
};
use crate::error::AppError;
use journal_core::{CredentialStore, JournalStore, User, UserId};
use std::sync::Arc;

/// Service for reading, replacing and deleting accounts
#[derive(Clone)]
pub struct UserService {
    credentials: Arc<dyn CredentialStore>,
    journals: Arc<dyn JournalStore>,
    hasher: PasswordHasher,
    guard: OwnershipGuard,
}

impl UserService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        journals: Arc<dyn JournalStore>,
        hasher: PasswordHasher,
        guard: OwnershipGuard,
    ) -> Self {
        Self {
            credentials,
            journals,
            hasher,
            guard,
        }
    }

    /// The caller's own account
    pub async fn me(&self, caller: &CallerIdentity) -> Result<UserResponse, AppError> {
        let user = self.load_self(caller).await?;
        self.respond(user).await
    }

    pub async fn update_me(
        &self,
        caller: &CallerIdentity,
        request: UserRequest,
    ) -> Result<UserResponse, AppError> {
        let user = self.load_self(caller).await?;
        self.replace(user, request).await
    }

    pub async fn delete_me(&self, caller: &CallerIdentity) -> Result<(), AppError> {
        let user = self.load_self(caller).await?;
        self.delete(user.id, caller).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::user_missing(),
            other => other,
        })
    }

    pub async fn get_user(
        &self,
        id: UserId,
        caller: &CallerIdentity,
    ) -> Result<UserResponse, AppError> {
        self.guard_target(id, caller)?;
        let user = self.load(id).await?;
        self.respond(user).await
    }

    pub async fn update_user(
        &self,
        id: UserId,
        caller: &CallerIdentity,
        request: UserRequest,
    ) -> Result<UserResponse, AppError> {
        self.guard_target(id, caller)?;
        let user = self.load(id).await?;
        self.replace(user, request).await
    }

    pub async fn delete_user(&self, id: UserId, caller: &CallerIdentity) -> Result<(), AppError> {
        self.guard_target(id, caller)?;
        self.delete(id, caller).await
    }

    fn guard_target(&self, id: UserId, caller: &CallerIdentity) -> Result<(), AppError> {
        self.guard.assert_self_or_admin(id, caller).map_err(|e| {
            audit_log(&AuditEvent::AccessDenied {
                user_id: caller.user_id,
                resource: format!("user:{id}"),
            });
            e
        })
    }

    /// A valid token whose account is gone is treated as unauthenticated
    async fn load_self(&self, caller: &CallerIdentity) -> Result<User, AppError> {
        self.credentials
            .find_user_by_id(caller.user_id)
            .await?
            .ok_or_else(AppError::user_missing)
    }

    async fn load(&self, id: UserId) -> Result<User, AppError> {
        self.credentials
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::user_not_found(id))
    }

    async fn respond(&self, user: User) -> Result<UserResponse, AppError> {
        let journal_ids = self.journals.journal_ids_by_owner(user.id).await?;
        Ok(UserResponse::from_user(user, journal_ids))
    }

    /// Full replacement of name, username and password
    ///
    /// The uniqueness pre-check only runs when the username actually changes;
    /// changing only its case keeps the account's own claim on it.
    async fn replace(&self, mut user: User, request: UserRequest) -> Result<UserResponse, AppError> {
        if !user.has_username(&request.username)
            && self.credentials.username_exists(&request.username).await?
        {
            return Err(AppError::DuplicateUsername);
        }

        user.name = request.name;
        user.username = request.username;
        user.password_hash = self.hasher.hash(&request.password)?;

        let id = user.id;
        let updated = self
            .credentials
            .update_user(&user)
            .await?
            .ok_or_else(|| AppError::user_not_found(id))?;

        tracing::info!(user_id = updated.id, "account updated");

        self.respond(updated).await
    }

    /// Remove an account and, with it, every journal it owns
    async fn delete(&self, id: UserId, caller: &CallerIdentity) -> Result<(), AppError> {
        if !self.credentials.delete_user(id).await? {
            return Err(AppError::user_not_found(id));
        }

        audit_log(&AuditEvent::AccountDeleted {
            user_id: id,
            deleted_by: caller.user_id,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{ROLE_ADMIN, ROLE_USER};
    use crate::testing::StaleExistenceCheck;
    use journal_core::config::PasswordCost;
    use journal_core::{MemoryStore, NewJournal, NewUser, OwnershipPolicy};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: UserService,
    }

    fn fixture(policy: OwnershipPolicy) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(&PasswordCost {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap();

        let service = UserService::new(
            store.clone(),
            store.clone(),
            hasher,
            OwnershipGuard::new(policy),
        );
        Fixture { store, service }
    }

    async fn seed(store: &MemoryStore, username: &str) -> CallerIdentity {
        let user = store
            .insert_user(NewUser::new(None, username, "hash"))
            .await
            .unwrap();
        CallerIdentity {
            user_id: user.id,
            username: user.username,
            roles: vec![ROLE_USER.to_string()],
        }
    }

    fn request(username: &str) -> UserRequest {
        UserRequest {
            name: Some("Renamed".to_string()),
            username: username.to_string(),
            password: "NewSecret1!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_me_lists_journal_ids() {
        let f = fixture(OwnershipPolicy::Forbidden);
        let alice = seed(&f.store, "alice").await;
        let journal = f
            .store
            .insert_journal(NewJournal::new(alice.user_id, "t", "m"))
            .await
            .unwrap();

        let me = f.service.me(&alice).await.unwrap();
        assert_eq!(me.username, "alice");
        assert_eq!(me.journal_ids, vec![journal.id]);
    }

    #[tokio::test]
    async fn test_update_me_rehashes_and_checks_uniqueness() {
        let f = fixture(OwnershipPolicy::Forbidden);
        let alice = seed(&f.store, "alice").await;
        seed(&f.store, "bobby").await;

        let clash = f.service.update_me(&alice, request("BOBBY")).await;
        assert_eq!(clash.unwrap_err(), AppError::DuplicateUsername);

        let updated = f.service.update_me(&alice, request("Alice")).await.unwrap();
        assert_eq!(updated.username, "Alice");
        assert_eq!(updated.name.as_deref(), Some("Renamed"));

        let stored = f.store.find_user_by_id(alice.user_id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "hash");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_by_id_requires_self_or_admin() {
        let f = fixture(OwnershipPolicy::Forbidden);
        let alice = seed(&f.store, "alice").await;
        let bob = seed(&f.store, "bobby").await;

        assert!(matches!(
            f.service.get_user(alice.user_id, &bob).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete_user(alice.user_id, &bob).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(f.service.get_user(bob.user_id, &bob).await.is_ok());

        let admin = CallerIdentity {
            roles: vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()],
            ..bob.clone()
        };
        assert!(f.service.get_user(alice.user_id, &admin).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_me_cascades_and_invalidates_identity() {
        let f = fixture(OwnershipPolicy::Forbidden);
        let alice = seed(&f.store, "alice").await;
        let journal = f
            .store
            .insert_journal(NewJournal::new(alice.user_id, "t", "m"))
            .await
            .unwrap();

        f.service.delete_me(&alice).await.unwrap();

        assert!(f.store.find_journal(journal.id).await.unwrap().is_none());
        assert_eq!(
            f.service.me(&alice).await.unwrap_err(),
            AppError::user_missing()
        );
    }

    #[tokio::test]
    async fn test_delete_me_twice_is_unauthorized() {
        let f = fixture(OwnershipPolicy::Forbidden);
        let alice = seed(&f.store, "alice").await;

        f.service.delete_me(&alice).await.unwrap();
        assert_eq!(
            f.service.delete_me(&alice).await.unwrap_err(),
            AppError::user_missing()
        );
    }

    #[tokio::test]
    async fn test_rename_clash_caught_by_store() {
        let store = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(&PasswordCost {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap();
        let service = UserService::new(
            Arc::new(StaleExistenceCheck::new(store.clone())),
            store.clone(),
            hasher,
            OwnershipGuard::default(),
        );
        let alice = seed(&store, "alice").await;
        seed(&store, "bobby").await;

        let clash = service.update_me(&alice, request("Bobby")).await;
        assert_eq!(clash.unwrap_err(), AppError::DuplicateUsername);

        let stored = store.find_user_by_id(alice.user_id).await.unwrap().unwrap();
        assert_eq!(stored.username, "alice");
    }

    #[tokio::test]
    async fn test_missing_user_by_id() {
        let f = fixture(OwnershipPolicy::Forbidden);
        let alice = seed(&f.store, "alice").await;
        let admin = CallerIdentity {
            roles: vec![ROLE_ADMIN.to_string()],
            ..alice
        };

        assert_eq!(
            f.service.get_user(999, &admin).await.unwrap_err(),
            AppError::user_not_found(999)
        );
    }
}

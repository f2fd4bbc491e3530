//! Authentication service
//!
//! Login and signup. Tokens are stateless: nothing is persisted on login and
//! there is no refresh or logout.

use super::jwt::{TokenCodec, ROLE_USER};
use super::models::{LoginRequest, TokenResponse, UserRequest, UserResponse};
use super::password::PasswordHasher;
use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use journal_core::{CredentialStore, NewUser, StoreError};
use std::sync::Arc;

/// Authentication service for login and account creation
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: TokenCodec,
    ) -> Self {
        Self {
            credentials,
            hasher,
            tokens,
        }
    }

    /// Authenticate by username and password
    ///
    /// Unknown usernames and wrong passwords produce the same error; the
    /// distinction only reaches the audit log.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenResponse)` - Bearer token for the stored username
    /// * `Err(AppError::InvalidCredentials)` - On any credential mismatch
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AppError> {
        let Some(user) = self
            .credentials
            .find_user_by_username(&request.username)
            .await?
        else {
            audit_log(&AuditEvent::LoginFailure {
                username: request.username,
                reason: "unknown username".to_string(),
            });
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(&request.password, &user.password_hash) {
            audit_log(&AuditEvent::LoginFailure {
                username: user.username,
                reason: "wrong password".to_string(),
            });
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(&user.username, user.id, &[ROLE_USER])?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id,
            username: user.username,
        });

        Ok(TokenResponse::bearer(access_token, self.tokens.ttl_secs()))
    }

    /// Register a new account
    ///
    /// The existence check is only a fast path; two concurrent signups for
    /// the same name both pass it, and the store's uniqueness guard settles
    /// the race.
    pub async fn create_user(&self, request: UserRequest) -> Result<UserResponse, AppError> {
        if self.credentials.username_exists(&request.username).await? {
            return Err(self.registration_rejected(request.username));
        }

        let password_hash = self.hasher.hash(&request.password)?;

        let user = match self
            .credentials
            .insert_user(NewUser::new(request.name, &request.username, password_hash))
            .await
        {
            Ok(user) => user,
            Err(StoreError::DuplicateUsername) => {
                return Err(self.registration_rejected(request.username))
            }
            Err(e) => return Err(e.into()),
        };

        audit_log(&AuditEvent::RegistrationSuccess {
            user_id: user.id,
            username: user.username.clone(),
        });

        Ok(UserResponse::from_user(user, Vec::new()))
    }

    fn registration_rejected(&self, username: String) -> AppError {
        audit_log(&AuditEvent::RegistrationFailure {
            username,
            reason: "username already exists".to_string(),
        });
        AppError::DuplicateUsername
    }
}

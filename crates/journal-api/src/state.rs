//! Application state management
//!
//! Built once at startup and shared read-only behind an `Arc`.

use crate::auth::{
    jwt::TokenCodec, ownership::OwnershipGuard, password::PasswordHasher, service::AuthService,
};
use crate::journals::JournalService;
use crate::users::UserService;
use journal_core::{AppConfig, ConfigError, CredentialStore, JournalStore};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Failures while assembling the application state
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Password(#[from] crate::auth::password::PasswordError),
}

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Process-wide token signer and verifier
    pub token_codec: TokenCodec,
    pub auth: AuthService,
    pub users: UserService,
    pub journals: JournalService,
    /// Kept for readiness checks
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Wire services over the given stores
    ///
    /// Fails when the signing secret is absent or too short, or when the
    /// password cost parameters are rejected.
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        journals: Arc<dyn JournalStore>,
    ) -> Result<Self, StateError> {
        let token_codec = TokenCodec::from_config(&config.auth)?;
        let hasher = PasswordHasher::new(&config.auth.password)?;
        let guard = OwnershipGuard::new(config.auth.ownership_policy);

        Ok(Self {
            auth: AuthService::new(credentials.clone(), hasher.clone(), token_codec.clone()),
            users: UserService::new(credentials.clone(), journals.clone(), hasher, guard),
            journals: JournalService::new(journals, credentials.clone(), guard),
            token_codec,
            credentials,
            config,
            start_time: Instant::now(),
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check whether the backing store answers
    pub async fn is_ready(&self) -> bool {
        match self.credentials.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "store ping failed");
                false
            }
        }
    }
}

/// Password hashing and verification using Argon2id
///
/// Hashes are stored as PHC strings, which embed the algorithm, cost
/// parameters and the 16-byte random salt, so verification needs nothing
/// but the stored string. Verification fails closed: a malformed hash is
/// reported exactly like a wrong password.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params,
};
use journal_core::config::PasswordCost;
use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),
}

/// Argon2id hasher with tunable work factor
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with explicit cost parameters
    pub fn new(cost: &PasswordCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_cost, cost.time_cost, cost.parallelism, Some(32))
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        })
    }

    /// Hash a plaintext password
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - PHC string format hash (includes algorithm, parameters, salt, and hash)
    /// * `Err(PasswordError)` - If hashing fails
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// Parameters are taken from the stored hash, so hashes produced under an
    /// older cost setting keep verifying after the configuration changes.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

//! Request and response bodies for login, signup and account management
//!
//! Request bodies carrying a password deliberately do not implement `Debug`.

use journal_core::{JournalId, User, UserId, USERNAME_MAX_LEN};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Minimum password length
pub const PASSWORD_MIN_LEN: usize = 8;

/// Minimum username length
pub const USERNAME_MIN_LEN: usize = 5;

/// Login request
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Always "Bearer"
    pub token_type: String,
    pub access_token: String,
    pub expires_in_seconds: u64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in_seconds: u64) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            access_token,
            expires_in_seconds,
        }
    }
}

/// Signup and full account update body
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct UserRequest {
    #[validate(length(max = 255, message = "name must be at most 255 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Public view of an account; never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: Option<String>,
    pub username: String,
    pub journal_ids: Vec<JournalId>,
}

impl UserResponse {
    pub fn from_user(user: User, journal_ids: Vec<JournalId>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            journal_ids,
        }
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Letters only, at least five of them, at most fifty
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let well_formed = username.chars().count() >= USERNAME_MIN_LEN
        && username.chars().all(|c| c.is_ascii_alphabetic());

    if !well_formed {
        return Err(invalid(
            "username",
            "username must be only alphabets and at least 5 letters",
        ));
    }
    if username.len() > USERNAME_MAX_LEN {
        return Err(invalid("username", "username must be at most 50 letters"));
    }
    Ok(())
}

/// At least eight characters drawn from ASCII letters, digits and punctuation
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(invalid(
            "password",
            "password must be at least 8 characters",
        ));
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_ascii_punctuation())
    {
        return Err(invalid(
            "password",
            "password can include letters, digits and special characters only",
        ));
    }
    Ok(())
}

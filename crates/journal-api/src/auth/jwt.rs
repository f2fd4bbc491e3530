//! JWT token generation and validation
//!
//! Implements stateless bearer tokens signed with HMAC-SHA256. The signing
//! secret is loaded once at startup; construction fails when it is missing
//! or shorter than 32 bytes. Expiry is exact: validation uses zero leeway.

use journal_core::{
    config::{MAX_TOKEN_TTL_SECS, MIN_SECRET_LEN},
    AuthConfig, ConfigError, UserId,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Role granted to every self-registered user
pub const ROLE_USER: &str = "USER";

/// Role allowed to manage other accounts
pub const ROLE_ADMIN: &str = "ADMIN";

/// JWT Claims structure containing user information
///
/// These claims are embedded in the access token and extracted during validation.
/// A token without an integer `uid` fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer (always "journalApp" by default)
    pub iss: String,
    /// Subject - username
    pub sub: String,
    /// Numeric user id
    pub uid: UserId,
    /// Granted roles
    pub roles: Vec<String>,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),

    #[error("Token expiry overflows at issued-at {0}")]
    ExpiryOverflow(u64),
}

/// Signs and verifies access tokens with a single process-wide secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_secs: u64,
}

impl TokenCodec {
    /// Build a codec, refusing secrets shorter than 32 bytes and lifetimes
    /// outside `1..=MAX_TOKEN_TTL_SECS`
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_secs: u64) -> Result<Self, ConfigError> {
        if secret.trim().len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_LEN,
            });
        }
        if ttl_secs == 0 || ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "JWT_ACCESS_EXPIRATION_SECS".to_string(),
                value: ttl_secs.to_string(),
            });
        }

        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            ttl_secs,
        })
    }

    /// Build a codec from the auth section of the application config
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.require_secret()?,
            config.issuer.clone(),
            config.access_expiration_secs,
        )
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token valid from now
    pub fn issue(&self, username: &str, uid: UserId, roles: &[&str]) -> Result<String, TokenError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        self.issue_at(username, uid, roles, now)
    }

    /// Issue a token with an explicit issued-at time (Unix seconds)
    pub fn issue_at(
        &self,
        username: &str,
        uid: UserId,
        roles: &[&str],
        issued_at: u64,
    ) -> Result<String, TokenError> {
        let exp = issued_at
            .checked_add(self.ttl_secs)
            .ok_or(TokenError::ExpiryOverflow(issued_at))?;

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: username.to_string(),
            uid,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            iat: issued_at,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(token)
    }

    /// Validate a token and extract claims
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Decoded and validated claims
    /// * `Err(TokenError)` - If validation fails (expired, invalid signature, etc.)
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::InvalidToken,
            },
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-32-bytes!";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "journalApp", 3600).unwrap()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_issue_and_verify_token() {
        let codec = codec();
        let token = codec.issue("alice", 42, &[ROLE_USER]).unwrap();

        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, 42);
        assert_eq!(claims.roles, vec!["USER".to_string()]);
        assert_eq!(claims.iss, "journalApp");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            TokenCodec::new("short", "journalApp", 3600),
            Err(ConfigError::SecretTooShort { .. })
        ));
        assert!(TokenCodec::from_config(&AuthConfig::default()).is_err());
    }

    #[test]
    fn test_token_lifetime_bounded() {
        for ttl in [0, MAX_TOKEN_TTL_SECS + 1, u64::MAX] {
            assert!(matches!(
                TokenCodec::new(SECRET, "journalApp", ttl),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
        assert!(TokenCodec::new(SECRET, "journalApp", MAX_TOKEN_TTL_SECS).is_ok());
    }

    #[test]
    fn test_expiry_overflow_is_an_error() {
        let result = codec().issue_at("alice", 1, &[ROLE_USER], u64::MAX - 10);
        assert!(matches!(result, Err(TokenError::ExpiryOverflow(_))));
    }

    #[test]
    fn test_invalid_token() {
        let result = codec().verify("invalid.token.here");
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenCodec::new("another-secret-key-that-is-32-bytes", "journalApp", 3600)
            .unwrap();
        let token = other.issue("alice", 1, &[ROLE_USER]).unwrap();

        let result = codec().verify(&token);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer() {
        let other = TokenCodec::new(SECRET, "someone-else", 3600).unwrap();
        let token = other.issue("alice", 1, &[ROLE_USER]).unwrap();

        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        // Issued two hours ago, expired one hour ago
        let token = codec
            .issue_at("alice", 1, &[ROLE_USER], now() - 7200)
            .unwrap();

        let result = codec.verify(&token);
        assert!(matches!(result, Err(TokenError::ExpiredToken)));
    }

    #[test]
    fn test_expiry_has_no_leeway() {
        let codec = codec();
        // Expired five seconds ago; the library default leeway would still accept it
        let token = codec
            .issue_at("alice", 1, &[ROLE_USER], now() - 3605)
            .unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::ExpiredToken)));

        let fresh = codec
            .issue_at("alice", 1, &[ROLE_USER], now() - 3500)
            .unwrap();
        assert!(codec.verify(&fresh).is_ok());
    }

    #[test]
    fn test_missing_uid_rejected() {
        #[derive(Serialize)]
        struct NoUid<'a> {
            iss: &'a str,
            sub: &'a str,
            roles: Vec<&'a str>,
            iat: u64,
            exp: u64,
        }

        let now = now();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoUid {
                iss: "journalApp",
                sub: "alice",
                roles: vec![ROLE_USER],
                iat: now,
                exp: now + 3600,
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec().verify(&token), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_non_integer_uid_rejected() {
        let now = now();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({
                "iss": "journalApp",
                "sub": "alice",
                "uid": "not-a-number",
                "roles": ["USER"],
                "iat": now,
                "exp": now + 3600,
            }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let now = now();
        let claims = Claims {
            iss: "journalApp".to_string(),
            sub: "alice".to_string(),
            uid: 1,
            roles: vec![ROLE_USER.to_string()],
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(codec().verify(&token).is_err());
    }
}

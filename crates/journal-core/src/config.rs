//! Journal Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development. The token signing secret has no
//! default and must always be supplied.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum accepted length of the token signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Longest access-token lifetime accepted from configuration (30 days)
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token, password and ownership settings
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.postgres_url = Some(url);
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Ok(secs) = std::env::var("JWT_ACCESS_EXPIRATION_SECS") {
            self.auth.access_expiration_secs = parse_var("JWT_ACCESS_EXPIRATION_SECS", secs)?;
        }
        if let Ok(policy) = std::env::var("OWNERSHIP_POLICY") {
            self.auth.ownership_policy = policy.parse()?;
        }
        if let Ok(cost) = std::env::var("PASSWORD_MEMORY_COST_KIB") {
            self.auth.password.memory_cost = parse_var("PASSWORD_MEMORY_COST_KIB", cost)?;
        }
        if let Ok(cost) = std::env::var("PASSWORD_TIME_COST") {
            self.auth.password.time_cost = parse_var("PASSWORD_TIME_COST", cost)?;
        }
        if let Ok(threads) = std::env::var("PASSWORD_PARALLELISM") {
            self.auth.password.parallelism = parse_var("PASSWORD_PARALLELISM", threads)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json_format = parse_var("LOG_JSON", json)?;
        }

        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            // Empty by default for security - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the in-memory store is used when unset
    pub postgres_url: Option<String>,

    /// PostgreSQL connection pool size
    pub postgres_pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            postgres_pool_size: 10,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret (at least 32 bytes)
    pub jwt_secret: Option<String>,

    /// Token issuer identifier
    pub issuer: String,

    /// Access token lifetime in seconds
    pub access_expiration_secs: u64,

    /// How a request for another user's resource is answered
    pub ownership_policy: OwnershipPolicy,

    /// Argon2 cost parameters
    pub password: PasswordCost,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: "journalApp".to_string(),
            access_expiration_secs: 3600,
            ownership_policy: OwnershipPolicy::default(),
            password: PasswordCost::default(),
        }
    }
}

impl AuthConfig {
    /// Return the signing secret, refusing absent or short values
    pub fn require_secret(&self) -> Result<&str, ConfigError> {
        let secret = self
            .jwt_secret
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired("JWT_SECRET".to_string()))?;

        if secret.trim().len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_LEN,
            });
        }

        Ok(secret)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("issuer", &self.issuer)
            .field("access_expiration_secs", &self.access_expiration_secs)
            .field("ownership_policy", &self.ownership_policy)
            .field("password", &self.password)
            .finish()
    }
}

/// Response to a caller touching a resource owned by someone else
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipPolicy {
    /// Answer 403 Forbidden; reveals that the resource exists
    #[default]
    Forbidden,
    /// Answer exactly as if the resource did not exist
    Conceal,
}

impl std::str::FromStr for OwnershipPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forbidden" => Ok(Self::Forbidden),
            "conceal" | "not_found" => Ok(Self::Conceal),
            _ => Err(ConfigError::InvalidValue {
                key: "OWNERSHIP_POLICY".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordCost {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("JWT secret must be at least {min} bytes")]
    SecretTooShort { min: usize },
}

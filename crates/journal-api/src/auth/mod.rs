//! Authentication and authorization module
//!
//! This module provides token-based authentication with the following components:
//! - Token issuing and verification (HS256)
//! - Password hashing with Argon2id
//! - Middleware that turns a bearer token into a `CallerIdentity`
//! - Ownership checks for single-resource operations
//! - Login and signup service

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod ownership;
pub mod password;
pub mod service;

pub use jwt::{Claims, TokenCodec, TokenError, ROLE_ADMIN, ROLE_USER};
pub use middleware::{auth_middleware, CallerIdentity};
pub use models::{LoginRequest, TokenResponse, UserRequest, UserResponse};
pub use ownership::OwnershipGuard;
pub use password::{PasswordError, PasswordHasher};
pub use service::AuthService;

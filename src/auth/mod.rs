//! # Auth Module
//!
//! Password hashing, stateless JWT access/refresh tokens, request identity
//! and the role capability check.

pub mod errors;
pub mod crypto;
pub mod jwt;
pub mod identity;
pub mod service;

pub use errors::{AuthError, AuthResult};
pub use identity::{CurrentUser, ACCESS_COOKIE, REFRESH_COOKIE};
pub use jwt::{JwtClaims, JwtConfig, JwtManager, TokenResponse, TokenType};

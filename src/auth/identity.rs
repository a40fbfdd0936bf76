//! # Request Identity
//!
//! The authenticated caller of a request, resolved from a bearer token or
//! the access cookie, and the role capability check every handler starts
//! with.

use axum::http::{header, HeaderMap};

use super::errors::{AuthError, AuthResult};
use super::jwt::{JwtManager, TokenType};
use crate::error::{AppError, AppResult};
use crate::models::Role;

/// Cookie carrying the access token for browser clients
pub const ACCESS_COOKIE: &str = "access_token_cookie";

/// Cookie carrying the refresh token, scoped to the refresh endpoint
pub const REFRESH_COOKIE: &str = "refresh_token_cookie";

/// Identity carried by a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    /// Resolve the caller from `Authorization: Bearer` first, then the
    /// access cookie.
    pub fn from_headers(headers: &HeaderMap, jwt: &JwtManager) -> AuthResult<Self> {
        let token = bearer_token(headers)
            .or_else(|| cookie_value(headers, ACCESS_COOKIE))
            .ok_or(AuthError::MissingToken)?;

        let claims = jwt.validate_token(&token, TokenType::Access)?;
        Ok(Self {
            id: JwtManager::get_user_id(&claims)?,
            role: claims.role,
        })
    }

    /// Fail with `Unauthorized` unless the caller holds one of `roles`
    pub fn require(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(user_id = self.id, role = %self.role, "role check failed");
            Err(AppError::Unauthorized)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

/// Value of a named cookie from every `Cookie` header of the request
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

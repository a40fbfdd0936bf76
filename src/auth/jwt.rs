//! # JWT Token Management
//!
//! JSON Web Token generation and validation.
//!
//! Tokens are self-contained: validation never touches the database and
//! there is no revocation list, so a token stays valid until it expires.
//! Two token types share one secret; the `typ` claim keeps a refresh
//! token from being used as an access token.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};
use crate::models::Role;

/// Purpose of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Role at issuance
    pub role: Role,

    pub typ: TokenType,

    /// Unique token id
    pub jti: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing
    pub secret: String,

    /// Access token lifetime
    pub access_token_ttl: Duration,

    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,

    /// Issuer identifier
    pub issuer: String,
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    /// Create a new JWT manager with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate an access token carrying the user id and role
    pub fn generate_access_token(&self, user_id: i64, role: Role) -> AuthResult<String> {
        self.generate(user_id, role, TokenType::Access, self.config.access_token_ttl)
    }

    /// Generate a longer-lived refresh token
    pub fn generate_refresh_token(&self, user_id: i64, role: Role) -> AuthResult<String> {
        self.generate(user_id, role, TokenType::Refresh, self.config.refresh_token_ttl)
    }

    fn generate(
        &self,
        user_id: i64,
        role: Role,
        typ: TokenType,
        ttl: Duration,
    ) -> AuthResult<String> {
        let now = Utc::now();
        let exp = now + ttl;

        let claims = JwtClaims {
            sub: user_id.to_string(),
            role,
            typ,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    /// Validate a token of the expected type and extract its claims
    pub fn validate_token(&self, token: &str, expected: TokenType) -> AuthResult<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        if token_data.claims.typ != expected {
            return Err(AuthError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// Extract user ID from validated claims
    pub fn get_user_id(claims: &JwtClaims) -> AuthResult<i64> {
        claims.sub.parse().map_err(|_| AuthError::MalformedToken)
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.config.access_token_ttl.num_seconds()
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.config.refresh_token_ttl.num_seconds()
    }
}

/// Token response returned to API clients
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

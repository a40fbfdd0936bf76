//! # Configuration
//!
//! Layered configuration loading using figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`CAMPUS_*` prefix, `__` as section separator)
//! 2. A TOML file (`campus.toml` in the working directory, or `--config`)
//! 3. Built-in defaults
//!
//! `CAMPUS_AUTH__JWT_SECRET` maps to `auth.jwt_secret`,
//! `CAMPUS_DATABASE__URL` to `database.url`, and so on. The loaded
//! [`AppConfig`] is validated once and then passed by reference into the
//! composition root; nothing reads the environment after startup.

mod errors;

pub use errors::ConfigError;

use std::path::{Path, PathBuf};

use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::JwtConfig;
use crate::http_server::HttpServerConfig;

/// Default TOML file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "campus.toml";

/// Minimum accepted JWT secret length in bytes
const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
}

/// Relational database settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://campus.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// Token and cookie settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub issuer: String,
    /// Mark auth cookies `Secure` (HTTPS deployments)
    pub cookie_secure: bool,
    /// Shared secret for the one-time first-admin bootstrap; unset disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_admin_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl_secs: 2 * 60 * 60,
            refresh_token_ttl_secs: 5 * 24 * 60 * 60,
            issuer: "campus".to_string(),
            cookie_secure: false,
            first_admin_secret: None,
        }
    }
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            access_token_ttl: Duration::seconds(self.access_token_ttl_secs),
            refresh_token_ttl: Duration::seconds(self.refresh_token_ttl_secs),
            issuer: self.issuer.clone(),
        }
    }
}

/// Request body and file type limits for uploaded resources
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 16 * 1024 * 1024,
            allowed_extensions: [".epub", ".jpg", ".jpeg", ".png", ".webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl UploadConfig {
    /// Whether a lowercase extension (with its dot) is accepted
    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

impl AppConfig {
    /// Load and validate configuration from defaults, TOML and environment.
    ///
    /// Does NOT call `dotenvy`; see [`AppConfig::load_with_dotenv`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the working directory, then [`AppConfig::load`].
    pub fn load_with_dotenv(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(path)
    }

    /// Like [`AppConfig::load_with_dotenv`], checking only the database
    /// section. For commands that never serve requests.
    pub fn load_database_with_dotenv(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config: Self = Self::figment(path).extract()?;
        config.validate_database()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }

        figment.merge(Env::prefixed("CAMPUS_").split("__"))
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::invalid(
                "auth.jwt_secret",
                format!("must be at least {} bytes", MIN_SECRET_LEN),
            ));
        }
        if self.auth.access_token_ttl_secs <= 0 {
            return Err(ConfigError::invalid(
                "auth.access_token_ttl_secs",
                "must be positive",
            ));
        }
        if self.auth.refresh_token_ttl_secs <= self.auth.access_token_ttl_secs {
            return Err(ConfigError::invalid(
                "auth.refresh_token_ttl_secs",
                "must be longer than the access token lifetime",
            ));
        }
        self.validate_database()?;
        if let Some(bad) = self
            .uploads
            .allowed_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(ConfigError::invalid(
                "uploads.allowed_extensions",
                format!("'{}' must look like '.ext'", bad),
            ));
        }
        Ok(())
    }

    pub fn validate_database(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::invalid("database.url", "must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

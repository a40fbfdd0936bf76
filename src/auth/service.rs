//! # Authentication Service
//!
//! Login, token refresh, identity lookup and the one-time first
//! administrator bootstrap.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::crypto;
use super::identity::CurrentUser;
use super::jwt::{JwtManager, TokenResponse, TokenType};
use crate::config::AuthConfig;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Role, User};
use crate::users::repository::{self, NewUserRow};
use crate::validation::{non_blank, ValidationErrors};

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FirstAdminRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub secret_key: String,
}

/// Public view of the caller
#[derive(Debug, Clone, Serialize)]
pub struct IdentityResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for IdentityResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Successful login: the user and a fresh token pair
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub tokens: TokenResponse,
}

// ==================
// Use cases
// ==================

/// Verify credentials and issue an access + refresh token pair.
///
/// Unknown user, inactive user and wrong password are indistinguishable
/// to the caller.
pub async fn login(
    db: &Database,
    jwt: &JwtManager,
    request: LoginRequest,
) -> AppResult<LoginOutcome> {
    let mut errors = ValidationErrors::default();
    errors.length("username", request.username.trim(), 1, 50);
    errors.length("password", &request.password, 1, 128);
    errors.into_result()?;

    let mut tx = db.begin().await?;
    let user = repository::find_by_username(&mut tx, request.username.trim()).await?;
    tx.commit().await?;

    let user = match user {
        Some(user) if user.is_active => user,
        _ => {
            tracing::info!(username = %request.username.trim(), "login rejected");
            return Err(super::AuthError::InvalidCredentials.into());
        }
    };

    if !crypto::verify_password(&request.password, &user.hashed_password)? {
        tracing::info!(user_id = user.id, "login rejected");
        return Err(super::AuthError::InvalidCredentials.into());
    }

    let access = jwt.generate_access_token(user.id, user.role)?;
    let refresh = jwt.generate_refresh_token(user.id, user.role)?;
    tracing::info!(user_id = user.id, role = %user.role, "login succeeded");

    Ok(LoginOutcome {
        tokens: TokenResponse::new(access, Some(refresh), jwt.access_ttl_secs()),
        user,
    })
}

/// Exchange a refresh token for a new access token. The user must still
/// exist and be active; the role is re-read from the database.
pub async fn refresh(
    db: &Database,
    jwt: &JwtManager,
    refresh_token: &str,
) -> AppResult<TokenResponse> {
    let claims = jwt.validate_token(refresh_token, TokenType::Refresh)?;
    let user_id = JwtManager::get_user_id(&claims)?;

    let mut tx = db.begin().await?;
    let user = repository::find_by_id(&mut tx, user_id).await?;
    tx.commit().await?;

    let user = user
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthenticated("User no longer active".to_string()))?;

    let access = jwt.generate_access_token(user.id, user.role)?;
    Ok(TokenResponse::new(access, None, jwt.access_ttl_secs()))
}

/// The caller's current account
pub async fn me(db: &Database, caller: &CurrentUser) -> AppResult<User> {
    let mut tx = db.begin().await?;
    let user = repository::find_by_id(&mut tx, caller.id).await?;
    tx.commit().await?;
    user.ok_or(AppError::NotFound("User"))
}

/// Create the first administrator.
///
/// Requires the configured bootstrap secret; rejected once any ADMIN exists.
pub async fn create_first_admin(
    db: &Database,
    config: &AuthConfig,
    request: FirstAdminRequest,
) -> AppResult<User> {
    let expected = config.first_admin_secret.as_deref().unwrap_or_default();
    if expected.is_empty() || !crypto::secrets_match(&request.secret_key, expected) {
        tracing::warn!("first-admin bootstrap rejected: bad secret");
        return Err(AppError::Unauthenticated("Invalid secret key".to_string()));
    }

    let mut errors = ValidationErrors::default();
    let username = request.username.trim().to_string();
    let full_name = non_blank(request.full_name);
    errors.length("username", &username, 3, 50);
    errors.optional_length("full_name", full_name.as_deref(), 0, 100);
    if let Err(super::AuthError::WeakPassword(reason)) =
        crypto::validate_password(&request.password)
    {
        errors.add("password", reason);
    }
    errors.into_result()?;

    let mut tx = db.begin().await?;
    if repository::role_exists(&mut tx, Role::Admin).await? {
        return Err(AppError::Conflict(
            "An administrator already exists".to_string(),
        ));
    }
    if repository::find_by_username(&mut tx, &username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let hashed = crypto::hash_password(&request.password)?;
    let user = repository::insert(
        &mut tx,
        NewUserRow {
            username: &username,
            document: None,
            hashed_password: &hashed,
            full_name: full_name.as_deref(),
            role: Role::Admin,
        },
        Utc::now(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, "first administrator created");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use chrono::Duration;

    fn jwt() -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: "service_test_secret_key".to_string(),
            access_token_ttl: Duration::hours(2),
            refresh_token_ttl: Duration::days(5),
            issuer: "test".to_string(),
        })
    }

    fn auth_config(secret: Option<&str>) -> AuthConfig {
        AuthConfig {
            first_admin_secret: secret.map(str::to_string),
            ..AuthConfig::default()
        }
    }

    fn admin_request(username: &str, secret: &str) -> FirstAdminRequest {
        FirstAdminRequest {
            username: username.to_string(),
            password: "admin123".to_string(),
            full_name: Some("Root".to_string()),
            secret_key: secret.to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_admin_then_login() {
        let db = Database::in_memory().await.unwrap();
        let config = auth_config(Some("bootstrap"));

        let admin = create_first_admin(&db, &config, admin_request("root", "bootstrap"))
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let jwt = jwt();
        let outcome = login(
            &db,
            &jwt,
            LoginRequest {
                username: "root".into(),
                password: "admin123".into(),
            },
        )
        .await
        .unwrap();
        let claims = jwt
            .validate_token(&outcome.tokens.access_token, TokenType::Access)
            .unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.sub, admin.id.to_string());
    }

    #[tokio::test]
    async fn test_first_admin_only_once() {
        let db = Database::in_memory().await.unwrap();
        let config = auth_config(Some("bootstrap"));

        create_first_admin(&db, &config, admin_request("root", "bootstrap"))
            .await
            .unwrap();
        let second = create_first_admin(&db, &config, admin_request("root2", "bootstrap")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_first_admin_secret_checks() {
        let db = Database::in_memory().await.unwrap();

        let config = auth_config(Some("bootstrap"));
        let wrong = create_first_admin(&db, &config, admin_request("root", "guess")).await;
        assert!(matches!(wrong, Err(AppError::Unauthenticated(_))));

        // Unset secret disables the endpoint, even for an empty key
        let unset = create_first_admin(&db, &auth_config(None), admin_request("root", "")).await;
        assert!(matches!(unset, Err(AppError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password_and_inactive_user() {
        let db = Database::in_memory().await.unwrap();
        let config = auth_config(Some("bootstrap"));
        let admin = create_first_admin(&db, &config, admin_request("root", "bootstrap"))
            .await
            .unwrap();
        let jwt = jwt();

        let bad = login(
            &db,
            &jwt,
            LoginRequest {
                username: "root".into(),
                password: "wrong-password".into(),
            },
        )
        .await;
        assert!(matches!(bad, Err(AppError::Unauthenticated(_))));

        crate::users::service::delete_user(&db, admin.id).await.unwrap();
        let inactive = login(
            &db,
            &jwt,
            LoginRequest {
                username: "root".into(),
                password: "admin123".into(),
            },
        )
        .await;
        assert!(matches!(inactive, Err(AppError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token() {
        let db = Database::in_memory().await.unwrap();
        let config = auth_config(Some("bootstrap"));
        let admin = create_first_admin(&db, &config, admin_request("root", "bootstrap"))
            .await
            .unwrap();
        let jwt = jwt();

        let refresh_token = jwt.generate_refresh_token(admin.id, Role::Admin).unwrap();
        let tokens = refresh(&db, &jwt, &refresh_token).await.unwrap();
        assert!(tokens.refresh_token.is_none());
        assert!(jwt
            .validate_token(&tokens.access_token, TokenType::Access)
            .is_ok());

        // An access token cannot be used to refresh
        let access = jwt.generate_access_token(admin.id, Role::Admin).unwrap();
        assert!(matches!(
            refresh(&db, &jwt, &access).await,
            Err(AppError::Unauthenticated(_))
        ));
    }
}

//! User management use cases.

use chrono::Utc;

use super::repository::{self, NewUserRow};
use super::schema::{NewUser, UserPatch};
use crate::auth::crypto;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Role, User};

/// Active users, optionally of one role
pub async fn list_users(db: &Database, role: Option<Role>) -> AppResult<Vec<User>> {
    let mut tx = db.begin().await?;
    let users = repository::list_active(&mut tx, role).await?;
    tx.commit().await?;
    Ok(users)
}

/// Any user by id, active or not
pub async fn get_user(db: &Database, id: i64) -> AppResult<User> {
    let mut tx = db.begin().await?;
    let user = repository::find_by_id(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    tx.commit().await?;
    Ok(user)
}

pub async fn create_user(db: &Database, input: NewUser) -> AppResult<User> {
    let mut tx = db.begin().await?;

    if repository::find_by_username(&mut tx, &input.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if repository::find_by_document(&mut tx, &input.document)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Document already registered".to_string()));
    }

    let hashed = crypto::hash_password(&input.password)?;
    let user = repository::insert(
        &mut tx,
        NewUserRow {
            username: &input.username,
            document: Some(&input.document),
            hashed_password: &hashed,
            full_name: input.full_name.as_deref(),
            role: input.role,
        },
        Utc::now(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, role = %user.role, "user created");
    Ok(user)
}

/// Apply a validated patch. Authorization (admin or self, privileged
/// fields admin-only) is the caller's responsibility.
pub async fn update_user(db: &Database, id: i64, patch: UserPatch) -> AppResult<User> {
    let mut tx = db.begin().await?;
    let mut user = repository::find_by_id(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if let Some(username) = patch.username {
        if username != user.username {
            if let Some(other) = repository::find_by_username(&mut tx, &username).await? {
                if other.id != id {
                    return Err(AppError::Conflict("Username already exists".to_string()));
                }
            }
        }
        user.username = username;
    }
    if let Some(document) = patch.document {
        if user.document.as_deref() != Some(document.as_str()) {
            if let Some(other) = repository::find_by_document(&mut tx, &document).await? {
                if other.id != id {
                    return Err(AppError::Conflict("Document already registered".to_string()));
                }
            }
        }
        user.document = Some(document);
    }
    if let Some(password) = patch.password {
        user.hashed_password = crypto::hash_password(&password)?;
    }
    if let Some(full_name) = patch.full_name {
        user.full_name = Some(full_name);
    }
    if let Some(role) = patch.role {
        user.role = role;
    }
    if let Some(is_active) = patch.is_active {
        user.is_active = is_active;
    }
    user.updated_at = Utc::now();

    let user = repository::save(&mut tx, &user).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, "user updated");
    Ok(user)
}

/// Soft delete
pub async fn delete_user(db: &Database, id: i64) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let mut user = repository::find_by_id(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    user.is_active = false;
    user.updated_at = Utc::now();
    repository::save(&mut tx, &user).await?;
    tx.commit().await?;

    tracing::info!(user_id = id, "user deactivated");
    Ok(())
}

/// Fetch a user and check it holds `role`; used for enrollment targets
pub(crate) async fn require_role(
    conn: &mut sqlx::SqliteConnection,
    id: i64,
    role: Role,
) -> AppResult<User> {
    match repository::find_by_id(conn, id).await? {
        Some(user) if user.role == role => Ok(user),
        Some(_) => Err(AppError::InvalidInput(format!(
            "User {} is not a {}",
            id,
            role.as_str().to_lowercase()
        ))),
        None => Err(AppError::InvalidInput(format!(
            "{} {} does not exist",
            role_label(role),
            id
        ))),
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "Administrator",
        Role::Teacher => "Teacher",
        Role::Student => "Student",
    }
}

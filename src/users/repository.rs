//! Row access for `users`. Every function runs on the caller's transaction.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::models::{Role, User};

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_by_document(
    conn: &mut SqliteConnection,
    document: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE document = ?")
        .bind(document)
        .fetch_optional(&mut *conn)
        .await
}

/// Active users, optionally of one role, by username
pub async fn list_active(
    conn: &mut SqliteConnection,
    role: Option<Role>,
) -> Result<Vec<User>, sqlx::Error> {
    match role {
        Some(role) => {
            sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE is_active = 1 AND role = ? ORDER BY username",
            )
            .bind(role)
            .fetch_all(&mut *conn)
            .await
        }
        None => {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE is_active = 1 ORDER BY username")
                .fetch_all(&mut *conn)
                .await
        }
    }
}

/// Whether any user holds `role`, active or not
pub async fn role_exists(conn: &mut SqliteConnection, role: Role) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(role)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

/// Columns of a new user row
pub struct NewUserRow<'a> {
    pub username: &'a str,
    pub document: Option<&'a str>,
    pub hashed_password: &'a str,
    pub full_name: Option<&'a str>,
    pub role: Role,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    row: NewUserRow<'_>,
    now: DateTime<Utc>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (username, document, hashed_password, full_name, role, is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 1, ?, ?)
         RETURNING *",
    )
    .bind(row.username)
    .bind(row.document)
    .bind(row.hashed_password)
    .bind(row.full_name)
    .bind(row.role)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

/// Write back every mutable column of `user`
pub async fn save(conn: &mut SqliteConnection, user: &User) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET username = ?, document = ?, hashed_password = ?, full_name = ?, role = ?,
             is_active = ?, updated_at = ?
         WHERE id = ?
         RETURNING *",
    )
    .bind(&user.username)
    .bind(&user.document)
    .bind(&user.hashed_password)
    .bind(&user.full_name)
    .bind(user.role)
    .bind(user.is_active)
    .bind(user.updated_at)
    .bind(user.id)
    .fetch_one(&mut *conn)
    .await
}

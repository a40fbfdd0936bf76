//! Documents. Unlike other content, every lookup requires an active row and
//! only the author may change or remove one.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::schema::DocumentInput;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::Document;

async fn find_active(conn: &mut SqliteConnection, id: i64) -> AppResult<Document> {
    sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ? AND is_active = 1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound("Document"))
}

fn ensure_author(document: &Document, caller_id: i64) -> AppResult<()> {
    if document.author_id == caller_id {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

pub async fn list_documents(db: &Database) -> AppResult<Vec<Document>> {
    let mut tx = db.begin().await?;
    let documents = sqlx::query_as::<_, Document>(
        "SELECT * FROM documents WHERE is_active = 1 ORDER BY updated_at DESC, id",
    )
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(documents)
}

pub async fn get_document(db: &Database, id: i64) -> AppResult<Document> {
    let mut tx = db.begin().await?;
    let document = find_active(&mut tx, id).await?;
    tx.commit().await?;
    Ok(document)
}

pub async fn create_document(
    db: &Database,
    input: DocumentInput,
    author_id: i64,
) -> AppResult<Document> {
    let mut tx = db.begin().await?;
    let now = Utc::now();
    let document = sqlx::query_as::<_, Document>(
        "INSERT INTO documents (title, content, author_id, is_active, created_at, updated_at)
         VALUES (?, ?, ?, 1, ?, ?)
         RETURNING *",
    )
    .bind(&input.title)
    .bind(&input.content)
    .bind(author_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(document_id = document.id, author_id, "document created");
    Ok(document)
}

pub async fn update_document(
    db: &Database,
    id: i64,
    input: DocumentInput,
    caller_id: i64,
) -> AppResult<Document> {
    let mut tx = db.begin().await?;
    let document = find_active(&mut tx, id).await?;
    ensure_author(&document, caller_id)?;

    let document = sqlx::query_as::<_, Document>(
        "UPDATE documents SET title = ?, content = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(&input.title)
    .bind(&input.content)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(document_id = id, "document updated");
    Ok(document)
}

/// Soft delete by the author
pub async fn delete_document(db: &Database, id: i64, caller_id: i64) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let document = find_active(&mut tx, id).await?;
    ensure_author(&document, caller_id)?;

    sqlx::query("UPDATE documents SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(document_id = id, "document deactivated");
    Ok(())
}

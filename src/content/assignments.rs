use chrono::Utc;
use sqlx::SqliteConnection;

use super::schema::NewAssignment;
use super::submissions::{self, Parent};
use crate::auth::CurrentUser;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Assignment, Submission};

async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_assignments(db: &Database) -> AppResult<Vec<Assignment>> {
    let mut tx = db.begin().await?;
    let assignments = sqlx::query_as::<_, Assignment>(
        "SELECT * FROM assignments WHERE is_active = 1 ORDER BY due_date, id",
    )
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(assignments)
}

pub async fn get_assignment(db: &Database, id: i64) -> AppResult<Assignment> {
    let mut tx = db.begin().await?;
    let assignment = find(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Assignment"))?;
    tx.commit().await?;
    Ok(assignment)
}

pub async fn create_assignment(
    db: &Database,
    input: NewAssignment,
    author_id: i64,
) -> AppResult<Assignment> {
    let mut tx = db.begin().await?;
    let now = Utc::now();
    let assignment = sqlx::query_as::<_, Assignment>(
        "INSERT INTO assignments (title, description, author_id, due_date, is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, 1, ?, ?)
         RETURNING *",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(author_id)
    .bind(input.due_date)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(assignment_id = assignment.id, author_id, "assignment created");
    Ok(assignment)
}

/// Soft delete by the author or an administrator
pub async fn delete_assignment(db: &Database, id: i64, caller: &CurrentUser) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let assignment = find(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Assignment"))?;
    if assignment.author_id != caller.id && !caller.is_admin() {
        return Err(AppError::Unauthorized);
    }

    sqlx::query("UPDATE assignments SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(assignment_id = id, "assignment deactivated");
    Ok(())
}

/// Submit before the due date to an active assignment
pub async fn submit_assignment(
    db: &Database,
    id: i64,
    student_id: i64,
    content: String,
) -> AppResult<Submission> {
    let mut tx = db.begin().await?;
    let assignment = find(&mut tx, id)
        .await?
        .filter(|a| a.is_active)
        .ok_or(AppError::NotFound("Assignment"))?;
    if assignment.is_past_due(Utc::now()) {
        return Err(AppError::Conflict(
            "Assignment due date has passed".to_string(),
        ));
    }

    let submission =
        submissions::insert(&mut tx, student_id, Parent::Assignment(id), &content, None).await?;
    tx.commit().await?;

    tracing::info!(
        assignment_id = id,
        student_id,
        submission_id = submission.id,
        "assignment submitted"
    );
    Ok(submission)
}

pub async fn list_assignment_submissions(db: &Database, id: i64) -> AppResult<Vec<Submission>> {
    let mut tx = db.begin().await?;
    find(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Assignment"))?;
    let submissions = submissions::list_for(&mut tx, Parent::Assignment(id)).await?;
    tx.commit().await?;
    Ok(submissions)
}

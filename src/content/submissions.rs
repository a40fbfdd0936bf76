//! Student submissions to assignments and exercises, and grading.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::schema::Grade;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::Submission;

/// Parent of a submission; exactly one per row
#[derive(Debug, Clone, Copy)]
pub(crate) enum Parent {
    Assignment(i64),
    Exercise(i64),
}

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    student_id: i64,
    parent: Parent,
    content: &str,
    score: Option<f64>,
) -> Result<Submission, sqlx::Error> {
    let (assignment_id, exercise_id) = match parent {
        Parent::Assignment(id) => (Some(id), None),
        Parent::Exercise(id) => (None, Some(id)),
    };
    sqlx::query_as::<_, Submission>(
        "INSERT INTO submissions (student_id, assignment_id, exercise_id, content, score, submitted_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(student_id)
    .bind(assignment_id)
    .bind(exercise_id)
    .bind(content)
    .bind(score)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn list_for(
    conn: &mut SqliteConnection,
    parent: Parent,
) -> Result<Vec<Submission>, sqlx::Error> {
    let (column, id) = match parent {
        Parent::Assignment(id) => ("assignment_id", id),
        Parent::Exercise(id) => ("exercise_id", id),
    };
    let sql = format!(
        "SELECT * FROM submissions WHERE {} = ? ORDER BY submitted_at, id",
        column
    );
    sqlx::query_as::<_, Submission>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await
}

/// Set score and feedback on any submission
pub async fn grade_submission(db: &Database, id: i64, grade: Grade) -> AppResult<Submission> {
    let mut tx = db.begin().await?;
    let submission = sqlx::query_as::<_, Submission>(
        "UPDATE submissions SET score = ?, feedback = ? WHERE id = ? RETURNING *",
    )
    .bind(grade.score)
    .bind(&grade.feedback)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Submission"))?;
    tx.commit().await?;

    tracing::info!(submission_id = id, score = grade.score, "submission graded");
    Ok(submission)
}

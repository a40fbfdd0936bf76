//! Subject use cases. Subjects are hard-deleted; name collisions are
//! allowed since one teacher may teach the same subject in several courses.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::schema::{NewSubject, SubjectPatch};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Role, Subject};
use crate::users::service::require_role;

pub(crate) async fn find_subject(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// All subjects by name, optionally of one teacher
pub async fn list_subjects(db: &Database, teacher_id: Option<i64>) -> AppResult<Vec<Subject>> {
    let mut tx = db.begin().await?;
    let subjects = match teacher_id {
        Some(teacher_id) => {
            sqlx::query_as::<_, Subject>(
                "SELECT * FROM subjects WHERE teacher_id = ? ORDER BY name, id",
            )
            .bind(teacher_id)
            .fetch_all(&mut *tx)
            .await?
        }
        None => {
            sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY name, id")
                .fetch_all(&mut *tx)
                .await?
        }
    };
    tx.commit().await?;
    Ok(subjects)
}

pub async fn get_subject(db: &Database, id: i64) -> AppResult<Subject> {
    let mut tx = db.begin().await?;
    let subject = find_subject(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Subject"))?;
    tx.commit().await?;
    Ok(subject)
}

pub async fn create_subject(db: &Database, input: NewSubject) -> AppResult<Subject> {
    let mut tx = db.begin().await?;
    require_role(&mut tx, input.teacher_id, Role::Teacher).await?;

    let now = Utc::now();
    let subject = sqlx::query_as::<_, Subject>(
        "INSERT INTO subjects (name, teacher_id, created_at, updated_at)
         VALUES (?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&input.name)
    .bind(input.teacher_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(subject_id = subject.id, teacher_id = subject.teacher_id, "subject created");
    Ok(subject)
}

pub async fn update_subject(db: &Database, id: i64, patch: SubjectPatch) -> AppResult<Subject> {
    let mut tx = db.begin().await?;
    let mut subject = find_subject(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Subject"))?;

    if let Some(teacher_id) = patch.teacher_id {
        if teacher_id != subject.teacher_id {
            require_role(&mut tx, teacher_id, Role::Teacher).await?;
        }
        subject.teacher_id = teacher_id;
    }
    if let Some(name) = patch.name {
        subject.name = name;
    }

    let subject = sqlx::query_as::<_, Subject>(
        "UPDATE subjects SET name = ?, teacher_id = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(&subject.name)
    .bind(subject.teacher_id)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(subject_id = id, "subject updated");
    Ok(subject)
}

/// Hard delete, together with every course assignment of the subject and
/// the classes (and their resources) held under it.
pub async fn delete_subject(db: &Database, id: i64) -> AppResult<()> {
    let mut tx = db.begin().await?;
    find_subject(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Subject"))?;

    let assignments = sqlx::query("DELETE FROM course_subjects WHERE subject_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM resources WHERE class_id IN (SELECT id FROM classes WHERE subject_id = ?)")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM classes WHERE subject_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(subject_id = id, course_assignments = assignments, "subject deleted");
    Ok(())
}

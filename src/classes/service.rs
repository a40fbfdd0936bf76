//! Class sessions and their resources. Both are hard-deleted; removing a
//! class cascades to its resources.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::schema::{NewClass, NewResource};
use crate::courses::service::find_course;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Class, Resource};
use crate::subjects::service::find_subject;

async fn find_class(conn: &mut SqliteConnection, id: i64) -> AppResult<Class> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound("Class"))
}

pub async fn create_class(
    db: &Database,
    course_id: i64,
    input: NewClass,
    created_by: i64,
) -> AppResult<Class> {
    let mut tx = db.begin().await?;
    find_course(&mut tx, course_id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    if find_subject(&mut tx, input.subject_id).await?.is_none() {
        return Err(AppError::InvalidInput(format!(
            "Subject {} does not exist",
            input.subject_id
        )));
    }

    let now = Utc::now();
    let class = sqlx::query_as::<_, Class>(
        "INSERT INTO classes (course_id, subject_id, title, description, class_number, date, created_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(course_id)
    .bind(input.subject_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.class_number)
    .bind(input.date)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(class_id = class.id, course_id, "class created");
    Ok(class)
}

/// Classes of a course ordered by class number
pub async fn list_classes(db: &Database, course_id: i64) -> AppResult<Vec<Class>> {
    let mut tx = db.begin().await?;
    find_course(&mut tx, course_id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    let classes = sqlx::query_as::<_, Class>(
        "SELECT * FROM classes WHERE course_id = ? ORDER BY class_number, date, id",
    )
    .bind(course_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(classes)
}

pub async fn get_class(db: &Database, id: i64) -> AppResult<Class> {
    let mut tx = db.begin().await?;
    let class = find_class(&mut tx, id).await?;
    tx.commit().await?;
    Ok(class)
}

pub async fn delete_class(db: &Database, id: i64) -> AppResult<()> {
    let mut tx = db.begin().await?;
    find_class(&mut tx, id).await?;
    sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(class_id = id, "class deleted");
    Ok(())
}

pub async fn add_resource(
    db: &Database,
    class_id: i64,
    input: NewResource,
    created_by: i64,
) -> AppResult<Resource> {
    let mut tx = db.begin().await?;
    find_class(&mut tx, class_id).await?;

    let resource = sqlx::query_as::<_, Resource>(
        "INSERT INTO resources (class_id, title, url, created_by, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(class_id)
    .bind(&input.title)
    .bind(&input.url)
    .bind(created_by)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(resource_id = resource.id, class_id, "resource attached");
    Ok(resource)
}

pub async fn list_resources(db: &Database, class_id: i64) -> AppResult<Vec<Resource>> {
    let mut tx = db.begin().await?;
    find_class(&mut tx, class_id).await?;
    let resources = sqlx::query_as::<_, Resource>(
        "SELECT * FROM resources WHERE class_id = ? ORDER BY created_at, id",
    )
    .bind(class_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(resources)
}

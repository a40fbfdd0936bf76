//! Course use cases, including the enrollment and teaching-assignment
//! upsert rule.
//!
//! Both join tables follow one rule: a natural-key lookup decides between
//! inserting a new row, rejecting an already-active one, or reactivating an
//! inactive one. Removal only ever deactivates, so there is at most one row
//! per natural key for the lifetime of the course.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};

use super::schema::{CourseFilter, CoursePatch, Enrollment, NewCourse, TeachingAssignment};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Course, CourseStudent, CourseSubject, Role};
use crate::subjects::service::find_subject;
use crate::users::service::require_role;

/// Result of an upsert on a join table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new row was inserted
    Created,
    /// An inactive row was switched back on
    Reactivated,
}

/// Active enrollment joined with the student's display data
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnrolledStudent {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub document: Option<String>,
    pub enrolled_at: DateTime<Utc>,
}

/// Active teaching assignment joined with subject and teacher names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssignedSubject {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub assigned_at: DateTime<Utc>,
}

pub(crate) async fn find_course(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Another active course with the same (name, academic_year, period)
async fn active_duplicate(
    conn: &mut SqliteConnection,
    name: &str,
    academic_year: &str,
    period: i64,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM courses
         WHERE name = ? AND academic_year = ? AND period = ? AND is_active = 1 AND id <> ?",
    )
    .bind(name)
    .bind(academic_year)
    .bind(period)
    .bind(exclude_id.unwrap_or(0))
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

fn duplicate_course() -> AppError {
    AppError::Conflict(
        "A course with the same name already exists for this academic year and period"
            .to_string(),
    )
}

// ==================
// Courses
// ==================

pub async fn list_courses(db: &Database, filter: CourseFilter) -> AppResult<Vec<Course>> {
    let mut tx = db.begin().await?;
    let courses = sqlx::query_as::<_, Course>(
        "SELECT * FROM courses
         WHERE is_active = ?
           AND (? IS NULL OR academic_year = ?)
           AND (? IS NULL OR period = ?)
           AND (? IS NULL OR grade_level = ?)
         ORDER BY academic_year DESC, period, grade_level, name",
    )
    .bind(filter.is_active)
    .bind(&filter.academic_year)
    .bind(&filter.academic_year)
    .bind(filter.period)
    .bind(filter.period)
    .bind(filter.grade_level)
    .bind(filter.grade_level)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(courses)
}

pub async fn get_course(db: &Database, id: i64) -> AppResult<Course> {
    let mut tx = db.begin().await?;
    let course = find_course(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    tx.commit().await?;
    Ok(course)
}

pub async fn create_course(db: &Database, input: NewCourse, created_by: i64) -> AppResult<Course> {
    let mut tx = db.begin().await?;

    if active_duplicate(&mut tx, &input.name, &input.academic_year, input.period, None).await? {
        return Err(duplicate_course());
    }

    let now = Utc::now();
    let course = sqlx::query_as::<_, Course>(
        "INSERT INTO courses (academic_year, period, grade_level, name, is_active, created_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, 1, ?, ?, ?)
         RETURNING *",
    )
    .bind(&input.academic_year)
    .bind(input.period)
    .bind(input.grade_level)
    .bind(&input.name)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(course_id = course.id, name = %course.name, "course created");
    Ok(course)
}

/// Apply a patch; the duplicate guard runs on the values after the patch
pub async fn update_course(db: &Database, id: i64, patch: CoursePatch) -> AppResult<Course> {
    let mut tx = db.begin().await?;
    let mut course = find_course(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;

    if let Some(academic_year) = patch.academic_year {
        course.academic_year = academic_year;
    }
    if let Some(period) = patch.period {
        course.period = period;
    }
    if let Some(grade_level) = patch.grade_level {
        course.grade_level = grade_level;
    }
    if let Some(name) = patch.name {
        course.name = name;
    }
    if let Some(is_active) = patch.is_active {
        course.is_active = is_active;
    }

    if course.is_active
        && active_duplicate(
            &mut tx,
            &course.name,
            &course.academic_year,
            course.period,
            Some(id),
        )
        .await?
    {
        return Err(duplicate_course());
    }

    let course = sqlx::query_as::<_, Course>(
        "UPDATE courses
         SET academic_year = ?, period = ?, grade_level = ?, name = ?, is_active = ?, updated_at = ?
         WHERE id = ?
         RETURNING *",
    )
    .bind(&course.academic_year)
    .bind(course.period)
    .bind(course.grade_level)
    .bind(&course.name)
    .bind(course.is_active)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(course_id = id, "course updated");
    Ok(course)
}

/// Soft delete
pub async fn delete_course(db: &Database, id: i64) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let affected = sqlx::query("UPDATE courses SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound("Course"));
    }
    tx.commit().await?;

    tracing::info!(course_id = id, "course deactivated");
    Ok(())
}

// ==================
// Enrollments
// ==================

pub async fn list_course_students(
    db: &Database,
    course_id: i64,
) -> AppResult<Vec<EnrolledStudent>> {
    let mut tx = db.begin().await?;
    find_course(&mut tx, course_id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;

    let students = sqlx::query_as::<_, EnrolledStudent>(
        "SELECT u.id, u.username, u.full_name, u.document, cs.enrolled_at
         FROM course_students cs
         JOIN users u ON u.id = cs.student_id
         WHERE cs.course_id = ? AND cs.is_active = 1
         ORDER BY u.full_name, u.username",
    )
    .bind(course_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(students)
}

pub async fn enroll_student(db: &Database, course_id: i64, input: Enrollment) -> AppResult<Upsert> {
    let mut tx = db.begin().await?;
    find_course(&mut tx, course_id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    require_role(&mut tx, input.student_id, Role::Student).await?;

    let existing = sqlx::query_as::<_, CourseStudent>(
        "SELECT * FROM course_students WHERE course_id = ? AND student_id = ?",
    )
    .bind(course_id)
    .bind(input.student_id)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match existing {
        Some(row) if row.is_active => {
            return Err(AppError::Conflict(
                "Student is already enrolled in this course".to_string(),
            ));
        }
        Some(row) => {
            sqlx::query("UPDATE course_students SET is_active = 1 WHERE id = ?")
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            Upsert::Reactivated
        }
        None => {
            sqlx::query(
                "INSERT INTO course_students (course_id, student_id, enrolled_at, is_active)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(course_id)
            .bind(input.student_id)
            .bind(Utc::now())
            .bind(input.is_active)
            .execute(&mut *tx)
            .await?;
            Upsert::Created
        }
    };
    tx.commit().await?;

    tracing::info!(course_id, student_id = input.student_id, ?outcome, "student enrolled");
    Ok(outcome)
}

pub async fn unenroll_student(db: &Database, course_id: i64, student_id: i64) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let affected = sqlx::query(
        "UPDATE course_students SET is_active = 0 WHERE course_id = ? AND student_id = ?",
    )
    .bind(course_id)
    .bind(student_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound("Enrollment"));
    }
    tx.commit().await?;

    tracing::info!(course_id, student_id, "student removed from course");
    Ok(())
}

// ==================
// Teaching assignments
// ==================

pub async fn list_course_subjects(
    db: &Database,
    course_id: i64,
) -> AppResult<Vec<AssignedSubject>> {
    let mut tx = db.begin().await?;
    find_course(&mut tx, course_id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;

    let subjects = sqlx::query_as::<_, AssignedSubject>(
        "SELECT cs.id, cs.subject_id, s.name AS subject_name, cs.teacher_id,
                COALESCE(NULLIF(u.full_name, ''), u.username) AS teacher_name,
                cs.assigned_at
         FROM course_subjects cs
         JOIN subjects s ON s.id = cs.subject_id
         JOIN users u ON u.id = cs.teacher_id
         WHERE cs.course_id = ? AND cs.is_active = 1
         ORDER BY s.name, teacher_name",
    )
    .bind(course_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(subjects)
}

pub async fn assign_subject(
    db: &Database,
    course_id: i64,
    input: TeachingAssignment,
) -> AppResult<Upsert> {
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
    require_role(&mut tx, input.teacher_id, Role::Teacher).await?;

    let existing = sqlx::query_as::<_, CourseSubject>(
        "SELECT * FROM course_subjects WHERE course_id = ? AND subject_id = ? AND teacher_id = ?",
    )
    .bind(course_id)
    .bind(input.subject_id)
    .bind(input.teacher_id)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match existing {
        Some(row) if row.is_active => {
            return Err(AppError::Conflict(
                "Subject is already assigned to this course with this teacher".to_string(),
            ));
        }
        Some(row) => {
            sqlx::query("UPDATE course_subjects SET is_active = 1 WHERE id = ?")
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            Upsert::Reactivated
        }
        None => {
            sqlx::query(
                "INSERT INTO course_subjects (course_id, subject_id, teacher_id, assigned_at, is_active)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(course_id)
            .bind(input.subject_id)
            .bind(input.teacher_id)
            .bind(Utc::now())
            .bind(input.is_active)
            .execute(&mut *tx)
            .await?;
            Upsert::Created
        }
    };
    tx.commit().await?;

    tracing::info!(
        course_id,
        subject_id = input.subject_id,
        teacher_id = input.teacher_id,
        ?outcome,
        "subject assigned to course"
    );
    Ok(outcome)
}

pub async fn unassign_subject(
    db: &Database,
    course_id: i64,
    subject_id: i64,
    teacher_id: i64,
) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let affected = sqlx::query(
        "UPDATE course_subjects SET is_active = 0
         WHERE course_id = ? AND subject_id = ? AND teacher_id = ?",
    )
    .bind(course_id)
    .bind(subject_id)
    .bind(teacher_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound("Course subject assignment"));
    }
    tx.commit().await?;

    tracing::info!(course_id, subject_id, teacher_id, "subject removed from course");
    Ok(())
}

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::SqliteConnection;

use super::schema::NewExercise;
use super::submissions::{self, Parent};
use crate::auth::CurrentUser;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Exercise, Submission};

/// Percentage of questions answered with their `correct_answer`.
///
/// Answers to question ids the exercise does not have are ignored; an
/// exercise without questions scores 0.
pub fn score_answers(questions: &Map<String, Value>, answers: &Map<String, Value>) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }
    let correct = answers
        .iter()
        .filter(|(id, answer)| {
            questions
                .get(id.as_str())
                .and_then(|q| q.get("correct_answer"))
                .is_some_and(|expected| expected == *answer)
        })
        .count();
    correct as f64 / questions.len() as f64 * 100.0
}

async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Exercise>, sqlx::Error> {
    sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_exercises(db: &Database) -> AppResult<Vec<Exercise>> {
    let mut tx = db.begin().await?;
    let exercises = sqlx::query_as::<_, Exercise>(
        "SELECT * FROM exercises WHERE is_active = 1 ORDER BY created_at, id",
    )
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(exercises)
}

pub async fn get_exercise(db: &Database, id: i64) -> AppResult<Exercise> {
    let mut tx = db.begin().await?;
    let exercise = find(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Exercise"))?;
    tx.commit().await?;
    Ok(exercise)
}

pub async fn create_exercise(
    db: &Database,
    input: NewExercise,
    author_id: i64,
) -> AppResult<Exercise> {
    let mut tx = db.begin().await?;
    let now = Utc::now();
    let exercise = sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises (title, description, questions, time_limit, author_id, is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 1, ?, ?)
         RETURNING *",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(Json(Value::Object(input.questions)))
    .bind(input.time_limit)
    .bind(author_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(exercise_id = exercise.id, author_id, "exercise created");
    Ok(exercise)
}

/// Soft delete by the author or an administrator
pub async fn delete_exercise(db: &Database, id: i64, caller: &CurrentUser) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let exercise = find(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Exercise"))?;
    if exercise.author_id != caller.id && !caller.is_admin() {
        return Err(AppError::Unauthorized);
    }

    sqlx::query("UPDATE exercises SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(exercise_id = id, "exercise deactivated");
    Ok(())
}

/// Store the answers of an active exercise and grade them immediately
pub async fn submit_exercise(
    db: &Database,
    id: i64,
    student_id: i64,
    answers: Map<String, Value>,
) -> AppResult<Submission> {
    let mut tx = db.begin().await?;
    let exercise = find(&mut tx, id)
        .await?
        .filter(|e| e.is_active)
        .ok_or(AppError::NotFound("Exercise"))?;

    let questions = exercise.questions.0.as_object().cloned().unwrap_or_default();
    let score = score_answers(&questions, &answers);
    let content = Value::Object(answers).to_string();

    let submission =
        submissions::insert(&mut tx, student_id, Parent::Exercise(id), &content, Some(score))
            .await?;
    tx.commit().await?;

    tracing::info!(exercise_id = id, student_id, score, "exercise submitted");
    Ok(submission)
}

pub async fn list_exercise_submissions(db: &Database, id: i64) -> AppResult<Vec<Submission>> {
    let mut tx = db.begin().await?;
    find(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("Exercise"))?;
    let submissions = submissions::list_for(&mut tx, Parent::Exercise(id)).await?;
    tx.commit().await?;
    Ok(submissions)
}

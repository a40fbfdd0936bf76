//! Author-owned coursework and student submissions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub author_id: i64,
    pub due_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        now > self.due_date
    }
}

/// Exercise with structured questions keyed by question id
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Exercise {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub questions: Json<Value>,
    /// Minutes
    pub time_limit: Option<i64>,
    pub author_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student's answer to exactly one assignment or exercise
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Submission {
    pub id: i64,
    pub student_id: i64,
    pub assignment_id: Option<i64>,
    pub exercise_id: Option<i64>,
    pub content: String,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A numbered class session of a subject within a course
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Class {
    pub id: i64,
    pub course_id: i64,
    pub subject_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub class_number: i64,
    pub date: DateTime<Utc>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File or link attached to a class
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resource {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub url: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

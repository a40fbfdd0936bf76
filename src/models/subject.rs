use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Subject owned by one teacher; may be taught in several courses
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub teacher_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

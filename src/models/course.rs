//! Courses and their two join tables: enrollments and teaching assignments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Grade a course belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum GradeLevel {
    Sexto,
    #[serde(rename = "Séptimo")]
    #[sqlx(rename = "Séptimo")]
    Septimo,
    Octavo,
    Noveno,
    #[serde(rename = "Décimo")]
    #[sqlx(rename = "Décimo")]
    Decimo,
    #[serde(rename = "Undécimo")]
    #[sqlx(rename = "Undécimo")]
    Undecimo,
}

impl GradeLevel {
    pub const ALL: [GradeLevel; 6] = [
        GradeLevel::Sexto,
        GradeLevel::Septimo,
        GradeLevel::Octavo,
        GradeLevel::Noveno,
        GradeLevel::Decimo,
        GradeLevel::Undecimo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::Sexto => "Sexto",
            GradeLevel::Septimo => "Séptimo",
            GradeLevel::Octavo => "Octavo",
            GradeLevel::Noveno => "Noveno",
            GradeLevel::Decimo => "Décimo",
            GradeLevel::Undecimo => "Undécimo",
        }
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeLevel::ALL
            .into_iter()
            .find(|grade| grade.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = GradeLevel::ALL.iter().map(|g| g.as_str()).collect();
                format!("must be one of: {}", names.join(", "))
            })
    }
}

/// Course row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub academic_year: String,
    pub period: i64,
    pub grade_level: GradeLevel,
    pub name: String,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enrollment of a student in a course
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseStudent {
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub enrolled_at: DateTime<Utc>,
    pub is_active: bool,
}

/// A teacher teaching a subject in a course
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseSubject {
    pub id: i64,
    pub course_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub assigned_at: DateTime<Utc>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_level_round_trips_accented_names() {
        for grade in GradeLevel::ALL {
            assert_eq!(grade.as_str().parse::<GradeLevel>().unwrap(), grade);
        }
        assert_eq!(
            serde_json::to_string(&GradeLevel::Septimo).unwrap(),
            "\"Séptimo\""
        );
    }

    #[test]
    fn test_unknown_grade_lists_options() {
        let err = "Primero".parse::<GradeLevel>().unwrap_err();
        assert!(err.contains("Undécimo"));
    }
}

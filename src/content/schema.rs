//! Request contracts for assignments, exercises, documents and
//! submissions.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::validation::{flexible_i64, non_blank, parse_datetime, ValidationErrors};

#[derive(Debug, Default, Deserialize)]
pub struct CreateAssignmentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
}

impl CreateAssignmentRequest {
    pub fn validate(self) -> Result<NewAssignment, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let title = self.title.trim().to_string();
        errors.length("title", &title, 1, 200);
        let due_date = parse_datetime(&self.due_date);
        if due_date.is_none() {
            errors.add("due_date", "must be an ISO-8601 date or timestamp");
        }

        match due_date {
            Some(due_date) if errors.is_empty() => Ok(NewAssignment {
                title,
                description: self.description,
                due_date,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitAssignmentRequest {
    #[serde(default)]
    pub content: String,
}

impl SubmitAssignmentRequest {
    pub fn validate(self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.content.trim().is_empty() {
            errors.add("content", "must not be empty");
        }
        errors.into_result()?;
        Ok(self.content)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GradeSubmissionRequest {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Grade {
    pub score: f64,
    pub feedback: Option<String>,
}

impl GradeSubmissionRequest {
    pub fn validate(self) -> Result<Grade, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match self.score {
            Some(score) if (0.0..=100.0).contains(&score) => {}
            Some(_) => errors.add("score", "must be between 0 and 100"),
            None => errors.add("score", "is required"),
        }
        match self.score {
            Some(score) if errors.is_empty() => Ok(Grade {
                score,
                feedback: non_blank(self.feedback),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateExerciseRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Value,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub time_limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub title: String,
    pub description: String,
    pub questions: Map<String, Value>,
    pub time_limit: Option<i64>,
}

impl CreateExerciseRequest {
    pub fn validate(self) -> Result<NewExercise, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let title = self.title.trim().to_string();
        errors.length("title", &title, 1, 200);

        let questions = match self.questions {
            Value::Object(map) if !map.is_empty() => {
                for (id, question) in &map {
                    if question.get("correct_answer").is_none() {
                        errors.add(
                            "questions",
                            format!("question '{}' has no correct_answer", id),
                        );
                    }
                }
                map
            }
            _ => {
                errors.add("questions", "must be a non-empty object keyed by question id");
                Map::new()
            }
        };

        if let Some(minutes) = self.time_limit {
            if minutes <= 0 {
                errors.add("time_limit", "must be a positive number of minutes");
            }
        }

        errors.into_result()?;
        Ok(NewExercise {
            title,
            description: self.description,
            questions,
            time_limit: self.time_limit,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitExerciseRequest {
    #[serde(default)]
    pub answers: Value,
}

impl SubmitExerciseRequest {
    pub fn validate(self) -> Result<Map<String, Value>, ValidationErrors> {
        match self.answers {
            Value::Object(map) => Ok(map),
            _ => {
                let mut errors = ValidationErrors::default();
                errors.add("answers", "must be an object keyed by question id");
                Err(errors)
            }
        }
    }
}

/// Body of document create and update
#[derive(Debug, Default, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub title: String,
    pub content: String,
}

impl DocumentRequest {
    pub fn validate(self) -> Result<DocumentInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let title = self.title.trim().to_string();
        errors.length("title", &title, 1, 200);
        errors.into_result()?;
        Ok(DocumentInput {
            title,
            content: self.content,
        })
    }
}

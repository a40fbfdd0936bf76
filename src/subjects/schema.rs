use serde::Deserialize;

use crate::validation::{flexible_i64, ValidationErrors};

#[derive(Debug, Default, Deserialize)]
pub struct CreateSubjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub teacher_id: i64,
}

impl CreateSubjectRequest {
    pub fn validate(self) -> Result<NewSubject, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = self.name.trim().to_string();
        errors.length("name", &name, 1, 100);
        match self.teacher_id {
            Some(id) => errors.positive_id("teacher_id", id),
            None => errors.add("teacher_id", "is required"),
        }
        errors.into_result()?;

        Ok(NewSubject {
            name,
            teacher_id: self.teacher_id.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub teacher_id: Option<i64>,
}

impl UpdateSubjectRequest {
    pub fn validate(self) -> Result<SubjectPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = self.name.map(|n| n.trim().to_string());
        errors.optional_length("name", name.as_deref(), 1, 100);
        if let Some(id) = self.teacher_id {
            errors.positive_id("teacher_id", id);
        }
        errors.into_result()?;

        Ok(SubjectPatch {
            name,
            teacher_id: self.teacher_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubjectListQuery {
    #[serde(default, deserialize_with = "flexible_i64")]
    pub teacher_id: Option<i64>,
}

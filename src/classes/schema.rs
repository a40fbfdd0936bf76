use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::UploadConfig;
use crate::validation::{file_extension, flexible_i64, non_blank, parse_datetime, ValidationErrors};

/// `POST /api/courses/:id/classes`
#[derive(Debug, Default, Deserialize)]
pub struct CreateClassRequest {
    #[serde(default, deserialize_with = "flexible_i64")]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub class_number: Option<i64>,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub subject_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub class_number: i64,
    pub date: DateTime<Utc>,
}

impl CreateClassRequest {
    pub fn validate(self) -> Result<NewClass, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim().to_string();
        let description = non_blank(self.description);
        errors.length("title", &title, 1, 100);
        errors.optional_length("description", description.as_deref(), 0, 255);

        match self.subject_id {
            Some(id) => errors.positive_id("subject_id", id),
            None => errors.add("subject_id", "is required"),
        }
        match self.class_number {
            Some(n) if n >= 1 => {}
            Some(_) => errors.add("class_number", "must be at least 1"),
            None => errors.add("class_number", "is required"),
        }
        let date = parse_datetime(&self.date);
        if date.is_none() {
            errors.add("date", "must be an ISO-8601 date or timestamp");
        }

        match (self.subject_id, self.class_number, date) {
            (Some(subject_id), Some(class_number), Some(date)) if errors.is_empty() => {
                Ok(NewClass {
                    subject_id,
                    title,
                    description,
                    class_number,
                    date,
                })
            }
            _ => Err(errors),
        }
    }
}

/// `POST /api/classes/:id/resources`
#[derive(Debug, Default, Deserialize)]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub title: String,
    pub url: String,
}

impl CreateResourceRequest {
    /// Checks the file extension of `url` against the upload allow-list
    pub fn validate(self, uploads: &UploadConfig) -> Result<NewResource, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim().to_string();
        let url = self.url.trim().to_string();
        errors.length("title", &title, 1, 100);
        errors.length("url", &url, 1, 500);

        if !url.is_empty() {
            match file_extension(&url) {
                Some(ext) if uploads.allows(&ext) => {}
                _ => errors.add(
                    "url",
                    format!(
                        "file type not allowed; accepted: {}",
                        uploads.allowed_extensions.join(", ")
                    ),
                ),
            }
        }

        errors.into_result()?;
        Ok(NewResource { title, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_requires_number_and_date() {
        let errors = CreateClassRequest {
            subject_id: Some(1),
            title: "Fractions".into(),
            class_number: Some(0),
            date: "someday".into(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("class_number"));
        assert!(errors.has("date"));
        assert!(!errors.has("title"));
    }

    #[test]
    fn test_valid_class() {
        let class = CreateClassRequest {
            subject_id: Some(3),
            title: "Fractions".into(),
            description: Some("Intro".into()),
            class_number: Some(1),
            date: "2025-02-03".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(class.class_number, 1);
        assert_eq!(class.description.as_deref(), Some("Intro"));
    }

    #[test]
    fn test_resource_extension_allow_list() {
        let uploads = UploadConfig::default();

        let ok = CreateResourceRequest {
            title: "Cover".into(),
            url: "https://cdn.example.com/cover.PNG".into(),
        };
        assert!(ok.validate(&uploads).is_ok());

        let bad = CreateResourceRequest {
            title: "Script".into(),
            url: "payload.exe".into(),
        };
        assert!(bad.validate(&uploads).unwrap_err().has("url"));

        let none = CreateResourceRequest {
            title: "Link".into(),
            url: "https://example.com/page".into(),
        };
        assert!(none.validate(&uploads).unwrap_err().has("url"));
    }
}

//! # Application Errors
//!
//! The error kinds surfaced to clients by every service and controller.
//! Database failures never leak their text to API callers: unique-key
//! violations become `Conflict`, everything else becomes `Internal`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthError;
use crate::validation::ValidationErrors;

/// Result type for service and controller operations
pub type AppResult<T> = Result<T, AppError>;

/// Error kinds shared by the JSON API and the form views
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input
    #[error("Invalid input")]
    Validation(ValidationErrors),

    /// A referenced entity or a precondition on input is invalid
    #[error("{0}")]
    InvalidInput(String),

    /// Missing, expired or invalid credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated but not allowed to perform the operation
    #[error("Not authorized to perform this operation")]
    Unauthorized,

    /// Entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate entity or business-rule violation
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure; the message is for logs only
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Stable identifier of the error kind, as sent to clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) => "VALIDATION_ERROR",
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status mirroring the error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to an end user
    pub fn public_message(&self) -> String {
        self.to_string()
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                tracing::debug!(error = %db_err, "unique constraint rejected write");
                AppError::Conflict("A record with the same key already exists".to_string())
            }
            sqlx::Error::RowNotFound => AppError::NotFound("Record"),
            _ => {
                tracing::error!(error = %err, "database operation failed");
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if let AuthError::WeakPassword(reason) = err {
            let mut errors = ValidationErrors::default();
            errors.add("password", reason);
            AppError::Validation(errors)
        } else if err.is_client_error() {
            AppError::Unauthenticated(err.to_string())
        } else {
            tracing::error!(error = %err, "authentication subsystem failure");
            AppError::Internal(err.to_string())
        }
    }
}

/// Error body of the JSON envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub status_code: u16,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.kind(),
            message: err.public_message(),
            details: err.details(),
            status_code: err.status_code().as_u16(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Validation(ValidationErrors::default()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Course").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_does_not_leak_cause() {
        let err = AppError::Internal("no such table: courses".into());
        let body = ErrorBody::from(&err);
        assert_eq!(body.error, "INTERNAL");
        assert!(!body.message.contains("courses"));
    }

    #[test]
    fn test_auth_errors_map_to_client_kinds() {
        let weak = AppError::from(AuthError::WeakPassword("too short".into()));
        assert_eq!(weak.kind(), "VALIDATION_ERROR");
        assert_eq!(AppError::from(AuthError::TokenExpired).kind(), "UNAUTHENTICATED");
        assert_eq!(AppError::from(AuthError::HashingFailed).kind(), "INTERNAL");
    }

    #[test]
    fn test_validation_error_carries_details() {
        let mut errors = ValidationErrors::default();
        errors.add("name", "must not be empty");
        let body = ErrorBody::from(&AppError::from(errors));
        assert_eq!(body.error, "VALIDATION_ERROR");
        let details = body.details.unwrap();
        assert_eq!(details[0]["field"], "name");
    }

    #[tokio::test]
    async fn test_unique_index_violation_is_conflict() {
        let db = crate::db::Database::in_memory().await.unwrap();
        let mut tx = db.begin().await.unwrap();
        let now = chrono::Utc::now();

        let (user,): (i64,) = sqlx::query_as(
            "INSERT INTO users (username, hashed_password, role, is_active, created_at, updated_at)
             VALUES ('sam', 'x', 'STUDENT', 1, ?, ?) RETURNING id",
        )
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .unwrap();
        let (course,): (i64,) = sqlx::query_as(
            "INSERT INTO courses
                 (academic_year, period, grade_level, name, created_by, created_at, updated_at)
             VALUES ('2024-2025', 1, 'Sexto', 'Sexto A', ?, ?, ?) RETURNING id",
        )
        .bind(user)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .unwrap();

        let enroll =
            "INSERT INTO course_students (course_id, student_id, enrolled_at) VALUES (?, ?, ?)";
        sqlx::query(enroll)
            .bind(course)
            .bind(user)
            .bind(now)
            .execute(&mut *tx)
            .await
            .unwrap();
        let duplicate = sqlx::query(enroll)
            .bind(course)
            .bind(user)
            .bind(now)
            .execute(&mut *tx)
            .await
            .unwrap_err();

        let err = AppError::from(duplicate);
        assert_eq!(err.kind(), "CONFLICT");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_row_is_not_found() {
        assert_eq!(AppError::from(sqlx::Error::RowNotFound).kind(), "NOT_FOUND");
    }
}

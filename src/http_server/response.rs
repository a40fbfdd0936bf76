//! Success envelope of the JSON API: `{message, data?, total?}`.
//! Errors use [`crate::error::ErrorBody`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            total: None,
            status: StatusCode::OK,
        }
    }

    /// 201 with the created entity
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// 200 with a list and its length
    pub fn list(message: impl Into<String>, items: Vec<T>) -> Self {
        let total = items.len();
        Self {
            total: Some(total),
            ..Self::ok(message, items)
        }
    }
}

impl ApiResponse<()> {
    /// Payload-free acknowledgement
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            total: None,
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

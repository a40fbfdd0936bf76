//! Request extractors shared by the API and view routes.
//!
//! Every rejection of the JSON API is an [`AppError`], so malformed paths,
//! queries and bodies get the same error envelope as service failures.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts, HeaderMap},
    response::Response,
    Form,
};
use serde::de::DeserializeOwned;

use super::flash::{redirect_with_flash, FlashLevel};
use super::server::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::Role;

pub(crate) const ADMIN: &[Role] = &[Role::Admin];
pub(crate) const STAFF: &[Role] = &[Role::Teacher, Role::Admin];
pub(crate) const STUDENT: &[Role] = &[Role::Student];

/// Where views send callers that are not logged in
pub const LOGIN_PAGE: &str = "/auth/login";

/// Where views send callers lacking the required role
pub const DASHBOARD_PAGE: &str = "/admin/dashboard";

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        CurrentUser::from_headers(&parts.headers, &state.jwt).map_err(|err| {
            tracing::debug!(error = %err, path = %parts.uri.path(), "request not authenticated");
            AppError::from(err)
        })
    }
}

/// Caller of a form view; unauthenticated requests are redirected to the
/// login page instead of receiving a JSON error.
#[derive(Debug, Clone, Copy)]
pub struct ViewUser(pub CurrentUser);

impl ViewUser {
    /// Redirect to the dashboard unless the caller holds one of `roles`
    pub fn require(&self, roles: &[Role]) -> Result<(), Response> {
        self.0.require(roles).map_err(|_| {
            redirect_with_flash(
                DASHBOARD_PAGE,
                FlashLevel::Danger,
                "You do not have permission to access this page",
            )
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for ViewUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        CurrentUser::from_headers(&parts.headers, &state.jwt)
            .map(ViewUser)
            .map_err(|_| {
                redirect_with_flash(
                    LOGIN_PAGE,
                    FlashLevel::Warning,
                    "Please log in to access this page",
                )
            })
    }
}

/// Path parameters with an [`AppError`] rejection
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
    }
}

/// Query string with an [`AppError`] rejection
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
    }
}

/// Whether the request carries an HTML form body
pub fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Body accepted either as a URL-encoded form or as JSON.
///
/// Any content type other than a form is parsed as JSON; an empty body is
/// read as `{}` so every field falls back to its default.
#[derive(Debug)]
pub struct JsonOrForm<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(req.headers()) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
            return Ok(JsonOrForm(value));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &body
        };
        serde_json::from_slice(body)
            .map(JsonOrForm)
            .map_err(|err| AppError::InvalidInput(format!("Malformed JSON body: {}", err)))
    }
}

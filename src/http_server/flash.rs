//! Redirect responses for the form views.
//!
//! A view answers with `303 See Other` and a short-lived `flash` cookie
//! holding `level|message` (URL-encoded) for the next page to display.
//! Auth cookies for browser logins are built here as well.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::error::AppError;

pub const FLASH_COOKIE: &str = "flash";

/// Path the refresh cookie is scoped to
pub const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

/// `Set-Cookie` value carrying a flash message
pub fn flash_cookie(level: FlashLevel, message: &str) -> String {
    let payload = format!("{}|{}", level.as_str(), message);
    format!(
        "{}={}; Path=/; Max-Age=60; SameSite=Lax",
        FLASH_COOKIE,
        urlencoding::encode(&payload)
    )
}

/// HTTP-only cookie holding a token
pub fn auth_cookie(name: &str, value: &str, path: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
        name, value, path, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expire a cookie previously set at `path`
pub fn clear_cookie(name: &str, path: &str) -> String {
    format!("{}=; Path={}; Max-Age=0; HttpOnly; SameSite=Lax", name, path)
}

/// Cookies removing both auth tokens
pub fn clear_auth_cookies() -> [String; 2] {
    [
        clear_cookie(ACCESS_COOKIE, "/"),
        clear_cookie(REFRESH_COOKIE, REFRESH_COOKIE_PATH),
    ]
}

/// 303 redirect setting every cookie in `cookies`
pub fn redirect_with_cookies<I>(to: &str, cookies: I) -> Response
where
    I: IntoIterator<Item = String>,
{
    let mut response = Redirect::to(to).into_response();
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::warn!(error = %err, "dropping unencodable cookie"),
        }
    }
    response
}

/// 303 redirect with a flash message
pub fn redirect_with_flash(to: &str, level: FlashLevel, message: &str) -> Response {
    redirect_with_cookies(to, [flash_cookie(level, message)])
}

/// Redirect describing a failed view action
pub fn redirect_with_error(to: &str, err: &AppError) -> Response {
    let level = match err {
        AppError::Internal(_) => FlashLevel::Danger,
        AppError::Validation(_) | AppError::InvalidInput(_) | AppError::Conflict(_) => {
            FlashLevel::Warning
        }
        _ => FlashLevel::Danger,
    };
    redirect_with_flash(to, level, &describe(err))
}

/// Single-line message for an error, including field details
pub fn describe(err: &AppError) -> String {
    match err {
        AppError::Validation(errors) => format!("Invalid input: {}", errors),
        other => other.public_message(),
    }
}

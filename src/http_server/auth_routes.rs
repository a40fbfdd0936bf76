//! Auth HTTP Routes
//!
//! Login for API and browser clients, token refresh, identity, logout and
//! the first-administrator bootstrap.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;

use super::extractors::{is_form, JsonOrForm, DASHBOARD_PAGE, LOGIN_PAGE};
use super::flash::{
    auth_cookie, clear_auth_cookies, flash_cookie, redirect_with_cookies, redirect_with_flash,
    FlashLevel, REFRESH_COOKIE_PATH,
};
use super::response::ApiResponse;
use super::server::AppState;
use crate::auth::identity::cookie_value;
use crate::auth::service::{self, FirstAdminRequest, IdentityResponse, LoginRequest, RefreshRequest};
use crate::auth::{CurrentUser, TokenResponse, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::error::{AppError, AppResult};

/// Auth routes, nested under `/auth`
pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/me", get(me_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .route("/first-admin", post(first_admin_handler))
}

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: IdentityResponse,
}

// ==================
// Handlers
// ==================

/// JSON clients get the token pair; form clients get cookies and a
/// redirect to the dashboard.
async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonOrForm(request): JsonOrForm<LoginRequest>,
) -> Response {
    let form = is_form(&headers);
    let outcome = match service::login(&state.db, &state.jwt, request).await {
        Ok(outcome) => outcome,
        Err(err) if form => {
            let message = match err {
                AppError::Validation(_) => "Username and password are required",
                _ => "Invalid username or password",
            };
            return redirect_with_flash(LOGIN_PAGE, FlashLevel::Danger, message);
        }
        Err(err) => return err.into_response(),
    };

    if !form {
        return ApiResponse::ok(
            "Login successful",
            LoginResponse {
                user: IdentityResponse::from(&outcome.user),
                tokens: outcome.tokens,
            },
        )
        .into_response();
    }

    let secure = state.config.auth.cookie_secure;
    let mut cookies = vec![auth_cookie(
        ACCESS_COOKIE,
        &outcome.tokens.access_token,
        "/",
        state.jwt.access_ttl_secs(),
        secure,
    )];
    if let Some(refresh) = &outcome.tokens.refresh_token {
        cookies.push(auth_cookie(
            REFRESH_COOKIE,
            refresh,
            REFRESH_COOKIE_PATH,
            state.jwt.refresh_ttl_secs(),
            secure,
        ));
    }
    cookies.push(flash_cookie(
        FlashLevel::Success,
        &format!("Welcome, {}!", outcome.user.display_name()),
    ));
    redirect_with_cookies(DASHBOARD_PAGE, cookies)
}

/// Refresh token from the body, else from the refresh cookie. A cookie
/// client also gets the new access token as a cookie.
async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonOrForm(request): JsonOrForm<RefreshRequest>,
) -> AppResult<Response> {
    let from_body = request.refresh_token.filter(|t| !t.trim().is_empty());
    let via_cookie = from_body.is_none();
    let token = from_body
        .or_else(|| cookie_value(&headers, REFRESH_COOKIE))
        .ok_or_else(|| AppError::Unauthenticated("Missing refresh token".to_string()))?;

    let tokens = service::refresh(&state.db, &state.jwt, token.trim()).await?;
    let mut response = ApiResponse::ok("Token refreshed", &tokens).into_response();

    if via_cookie {
        let cookie = auth_cookie(
            ACCESS_COOKIE,
            &tokens.access_token,
            "/",
            state.jwt.access_ttl_secs(),
            state.config.auth.cookie_secure,
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}

async fn me_handler(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
) -> AppResult<ApiResponse<IdentityResponse>> {
    let user = service::me(&state.db, &caller).await?;
    Ok(ApiResponse::ok("Current user", IdentityResponse::from(&user)))
}

/// Tokens are stateless; logging out only drops the cookies
async fn logout_handler() -> Response {
    let cookies = clear_auth_cookies()
        .into_iter()
        .chain([flash_cookie(FlashLevel::Info, "You have been logged out")]);
    redirect_with_cookies(LOGIN_PAGE, cookies)
}

async fn first_admin_handler(
    State(state): State<Arc<AppState>>,
    JsonOrForm(request): JsonOrForm<FirstAdminRequest>,
) -> AppResult<ApiResponse<IdentityResponse>> {
    let user = service::create_first_admin(&state.db, &state.config.auth, request).await?;
    Ok(ApiResponse::created(
        "Administrator created",
        IdentityResponse::from(&user),
    ))
}

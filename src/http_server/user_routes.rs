//! User management API under `/api/users`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};

use super::extractors::{ApiPath, ApiQuery, JsonOrForm, ADMIN};
use super::response::ApiResponse;
use super::server::AppState;
use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::users::{service, CreateUserRequest, UpdateUserRequest, UserListQuery};

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Administrators, or the user acting on their own account
fn ensure_self_or_admin(caller: &CurrentUser, id: i64) -> AppResult<()> {
    if caller.is_admin() || caller.id == id {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> AppResult<ApiResponse<Vec<User>>> {
    caller.require(ADMIN)?;
    let role = query.validate()?;
    let users = service::list_users(&state.db, role).await?;
    Ok(ApiResponse::list("Users retrieved", users))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    body: Result<JsonOrForm<CreateUserRequest>, AppError>,
) -> AppResult<ApiResponse<User>> {
    caller.require(ADMIN)?;
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let user = service::create_user(&state.db, input).await?;
    Ok(ApiResponse::created("User created", user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<User>> {
    ensure_self_or_admin(&caller, id)?;
    let user = service::get_user(&state.db, id).await?;
    Ok(ApiResponse::ok("User retrieved", user))
}

/// Non-administrators may edit their own profile fields but never their
/// role or active flag.
async fn update_user(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<UpdateUserRequest>, AppError>,
) -> AppResult<ApiResponse<User>> {
    ensure_self_or_admin(&caller, id)?;
    let JsonOrForm(request) = body?;
    let patch = request.validate()?;
    if !caller.is_admin() && patch.changes_privileges() {
        return Err(AppError::Unauthorized);
    }
    let user = service::update_user(&state.db, id, patch).await?;
    Ok(ApiResponse::ok("User updated", user))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    caller.require(ADMIN)?;
    service::delete_user(&state.db, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "User deleted"))
}

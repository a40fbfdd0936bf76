//! Class sessions of a course and the resources attached to them.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use super::extractors::{ApiPath, JsonOrForm, STAFF};
use super::response::ApiResponse;
use super::server::AppState;
use crate::auth::CurrentUser;
use crate::classes::{service, CreateClassRequest, CreateResourceRequest};
use crate::error::{AppError, AppResult};
use crate::models::{Class, Resource};

pub fn class_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/courses/:id/classes",
            get(list_classes).post(create_class),
        )
        .route("/classes/:id", get(get_class).delete(delete_class))
        .route(
            "/classes/:id/resources",
            get(list_resources).post(add_resource),
        )
}

async fn list_classes(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    ApiPath(course_id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<Class>>> {
    let classes = service::list_classes(&state.db, course_id).await?;
    Ok(ApiResponse::list("Classes retrieved", classes))
}

async fn create_class(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(course_id): ApiPath<i64>,
    body: Result<JsonOrForm<CreateClassRequest>, AppError>,
) -> AppResult<ApiResponse<Class>> {
    caller.require(STAFF)?;
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let class = service::create_class(&state.db, course_id, input, caller.id).await?;
    Ok(ApiResponse::created("Class created", class))
}

async fn get_class(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Class>> {
    let class = service::get_class(&state.db, id).await?;
    Ok(ApiResponse::ok("Class retrieved", class))
}

async fn delete_class(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    caller.require(STAFF)?;
    service::delete_class(&state.db, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Class deleted"))
}

async fn list_resources(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<Resource>>> {
    let resources = service::list_resources(&state.db, id).await?;
    Ok(ApiResponse::list("Resources retrieved", resources))
}

async fn add_resource(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<CreateResourceRequest>, AppError>,
) -> AppResult<ApiResponse<Resource>> {
    caller.require(STAFF)?;
    let JsonOrForm(request) = body?;
    let input = request.validate(&state.config.uploads)?;
    let resource = service::add_resource(&state.db, id, input, caller.id).await?;
    Ok(ApiResponse::created("Resource attached", resource))
}

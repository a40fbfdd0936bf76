//! Subject API under `/api/subjects`. Administrators only.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use super::extractors::{ApiPath, ApiQuery, JsonOrForm, ADMIN};
use super::response::ApiResponse;
use super::server::AppState;
use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::Subject;
use crate::subjects::{service, CreateSubjectRequest, SubjectListQuery, UpdateSubjectRequest};

pub fn subject_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subjects", get(list_subjects).post(create_subject))
        .route(
            "/subjects/:id",
            get(get_subject).patch(update_subject).delete(delete_subject),
        )
}

async fn list_subjects(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiQuery(query): ApiQuery<SubjectListQuery>,
) -> AppResult<ApiResponse<Vec<Subject>>> {
    caller.require(ADMIN)?;
    let subjects = service::list_subjects(&state.db, query.teacher_id).await?;
    Ok(ApiResponse::list("Subjects retrieved", subjects))
}

async fn create_subject(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    body: Result<JsonOrForm<CreateSubjectRequest>, AppError>,
) -> AppResult<ApiResponse<Subject>> {
    caller.require(ADMIN)?;
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let subject = service::create_subject(&state.db, input).await?;
    Ok(ApiResponse::created("Subject created", subject))
}

async fn get_subject(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Subject>> {
    caller.require(ADMIN)?;
    let subject = service::get_subject(&state.db, id).await?;
    Ok(ApiResponse::ok("Subject retrieved", subject))
}

async fn update_subject(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<UpdateSubjectRequest>, AppError>,
) -> AppResult<ApiResponse<Subject>> {
    caller.require(ADMIN)?;
    let JsonOrForm(request) = body?;
    let patch = request.validate()?;
    let subject = service::update_subject(&state.db, id, patch).await?;
    Ok(ApiResponse::ok("Subject updated", subject))
}

/// Hard delete; course assignments and classes of the subject go with it
async fn delete_subject(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    caller.require(ADMIN)?;
    service::delete_subject(&state.db, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Subject deleted"))
}

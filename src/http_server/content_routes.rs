//! Coursework API: assignments, exercises, documents and grading.
//!
//! Reading is open to every authenticated role; authoring needs TEACHER or
//! ADMIN and submitting needs STUDENT.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use super::extractors::{ApiPath, JsonOrForm, STAFF, STUDENT};
use super::response::ApiResponse;
use super::server::AppState;
use crate::auth::CurrentUser;
use crate::content::{
    assignments, documents, exercises, submissions, CreateAssignmentRequest,
    CreateExerciseRequest, DocumentRequest, GradeSubmissionRequest, SubmitAssignmentRequest,
    SubmitExerciseRequest,
};
use crate::error::{AppError, AppResult};
use crate::models::{Assignment, Document, Exercise, Submission};

pub fn content_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/assignments",
            get(list_assignments).post(create_assignment),
        )
        .route(
            "/assignments/:id",
            get(get_assignment).delete(delete_assignment),
        )
        .route("/assignments/:id/submit", post(submit_assignment))
        .route(
            "/assignments/:id/submissions",
            get(list_assignment_submissions),
        )
        .route("/submissions/:id/grade", post(grade_submission))
        .route("/exercises", get(list_exercises).post(create_exercise))
        .route(
            "/exercises/:id",
            get(get_exercise).delete(delete_exercise),
        )
        .route("/exercises/:id/submit", post(submit_exercise))
        .route(
            "/exercises/:id/submissions",
            get(list_exercise_submissions),
        )
        .route("/documents", get(list_documents).post(create_document))
        .route(
            "/documents/:id",
            get(get_document).put(update_document).delete(delete_document),
        )
}

// ==================
// Assignments
// ==================

async fn list_assignments(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
) -> AppResult<ApiResponse<Vec<Assignment>>> {
    let items = assignments::list_assignments(&state.db).await?;
    Ok(ApiResponse::list("Assignments retrieved", items))
}

async fn create_assignment(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    body: Result<JsonOrForm<CreateAssignmentRequest>, AppError>,
) -> AppResult<ApiResponse<Assignment>> {
    caller.require(STAFF)?;
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let assignment = assignments::create_assignment(&state.db, input, caller.id).await?;
    Ok(ApiResponse::created("Assignment created", assignment))
}

async fn get_assignment(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Assignment>> {
    let assignment = assignments::get_assignment(&state.db, id).await?;
    Ok(ApiResponse::ok("Assignment retrieved", assignment))
}

async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    assignments::delete_assignment(&state.db, id, &caller).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Assignment deleted"))
}

async fn submit_assignment(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<SubmitAssignmentRequest>, AppError>,
) -> AppResult<ApiResponse<Submission>> {
    caller.require(STUDENT)?;
    let JsonOrForm(request) = body?;
    let content = request.validate()?;
    let submission = assignments::submit_assignment(&state.db, id, caller.id, content).await?;
    Ok(ApiResponse::created("Assignment submitted", submission))
}

async fn list_assignment_submissions(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<Submission>>> {
    caller.require(STAFF)?;
    let items = assignments::list_assignment_submissions(&state.db, id).await?;
    Ok(ApiResponse::list("Submissions retrieved", items))
}

async fn grade_submission(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<GradeSubmissionRequest>, AppError>,
) -> AppResult<ApiResponse<Submission>> {
    caller.require(STAFF)?;
    let JsonOrForm(request) = body?;
    let grade = request.validate()?;
    let submission = submissions::grade_submission(&state.db, id, grade).await?;
    Ok(ApiResponse::ok("Submission graded", submission))
}

// ==================
// Exercises
// ==================

async fn list_exercises(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
) -> AppResult<ApiResponse<Vec<Exercise>>> {
    let items = exercises::list_exercises(&state.db).await?;
    Ok(ApiResponse::list("Exercises retrieved", items))
}

async fn create_exercise(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    body: Result<JsonOrForm<CreateExerciseRequest>, AppError>,
) -> AppResult<ApiResponse<Exercise>> {
    caller.require(STAFF)?;
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let exercise = exercises::create_exercise(&state.db, input, caller.id).await?;
    Ok(ApiResponse::created("Exercise created", exercise))
}

async fn get_exercise(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Exercise>> {
    let exercise = exercises::get_exercise(&state.db, id).await?;
    Ok(ApiResponse::ok("Exercise retrieved", exercise))
}

async fn delete_exercise(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    exercises::delete_exercise(&state.db, id, &caller).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Exercise deleted"))
}

async fn submit_exercise(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<SubmitExerciseRequest>, AppError>,
) -> AppResult<ApiResponse<Submission>> {
    caller.require(STUDENT)?;
    let JsonOrForm(request) = body?;
    let answers = request.validate()?;
    let submission = exercises::submit_exercise(&state.db, id, caller.id, answers).await?;
    Ok(ApiResponse::created("Exercise submitted", submission))
}

async fn list_exercise_submissions(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<Submission>>> {
    caller.require(STAFF)?;
    let items = exercises::list_exercise_submissions(&state.db, id).await?;
    Ok(ApiResponse::list("Submissions retrieved", items))
}

// ==================
// Documents
// ==================

async fn list_documents(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
) -> AppResult<ApiResponse<Vec<Document>>> {
    let items = documents::list_documents(&state.db).await?;
    Ok(ApiResponse::list("Documents retrieved", items))
}

async fn create_document(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    body: Result<JsonOrForm<DocumentRequest>, AppError>,
) -> AppResult<ApiResponse<Document>> {
    caller.require(STAFF)?;
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let document = documents::create_document(&state.db, input, caller.id).await?;
    Ok(ApiResponse::created("Document created", document))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Document>> {
    let document = documents::get_document(&state.db, id).await?;
    Ok(ApiResponse::ok("Document retrieved", document))
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<DocumentRequest>, AppError>,
) -> AppResult<ApiResponse<Document>> {
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let document = documents::update_document(&state.db, id, input, caller.id).await?;
    Ok(ApiResponse::ok("Document updated", document))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    documents::delete_document(&state.db, id, caller.id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Document deleted"))
}

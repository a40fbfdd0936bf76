//! Course API under `/api/courses`: courses, enrollments and teaching
//! assignments. Administrators only.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Router,
};

use super::extractors::{ApiPath, ApiQuery, JsonOrForm, ADMIN};
use super::response::ApiResponse;
use super::server::AppState;
use crate::auth::CurrentUser;
use crate::courses::{
    service, AssignSubjectRequest, AssignedSubject, CourseListQuery, CreateCourseRequest,
    EnrollStudentRequest, EnrolledStudent, UpdateCourseRequest, Upsert,
};
use crate::error::{AppError, AppResult};
use crate::models::Course;

pub fn course_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/:id",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route(
            "/courses/:id/students",
            get(list_students).post(enroll_student),
        )
        .route(
            "/courses/:id/students/:student_id",
            delete(unenroll_student),
        )
        .route(
            "/courses/:id/subjects",
            get(list_subjects).post(assign_subject),
        )
        .route(
            "/courses/:id/subjects/:subject_id/:teacher_id",
            delete(unassign_subject),
        )
}

/// 201 for a new row, 200 when an inactive one was switched back on
fn upsert_response(outcome: Upsert, created: &str, reactivated: &str) -> ApiResponse<()> {
    match outcome {
        Upsert::Created => ApiResponse::message(StatusCode::CREATED, created),
        Upsert::Reactivated => ApiResponse::message(StatusCode::OK, reactivated),
    }
}

async fn list_courses(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiQuery(query): ApiQuery<CourseListQuery>,
) -> AppResult<ApiResponse<Vec<Course>>> {
    caller.require(ADMIN)?;
    let filter = query.validate()?;
    let courses = service::list_courses(&state.db, filter).await?;
    Ok(ApiResponse::list("Courses retrieved", courses))
}

async fn create_course(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    body: Result<JsonOrForm<CreateCourseRequest>, AppError>,
) -> AppResult<ApiResponse<Course>> {
    caller.require(ADMIN)?;
    let JsonOrForm(request) = body?;
    let input = request.validate()?;
    let course = service::create_course(&state.db, input, caller.id).await?;
    Ok(ApiResponse::created("Course created", course))
}

async fn get_course(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Course>> {
    caller.require(ADMIN)?;
    let course = service::get_course(&state.db, id).await?;
    Ok(ApiResponse::ok("Course retrieved", course))
}

async fn update_course(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<UpdateCourseRequest>, AppError>,
) -> AppResult<ApiResponse<Course>> {
    caller.require(ADMIN)?;
    let JsonOrForm(request) = body?;
    let patch = request.validate()?;
    let course = service::update_course(&state.db, id, patch).await?;
    Ok(ApiResponse::ok("Course updated", course))
}

async fn delete_course(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    caller.require(ADMIN)?;
    service::delete_course(&state.db, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Course deleted"))
}

async fn list_students(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<EnrolledStudent>>> {
    caller.require(ADMIN)?;
    let students = service::list_course_students(&state.db, id).await?;
    Ok(ApiResponse::list("Students retrieved", students))
}

async fn enroll_student(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<EnrollStudentRequest>, AppError>,
) -> AppResult<ApiResponse<()>> {
    caller.require(ADMIN)?;
    let JsonOrForm(request) = body?;
    let enrollment = request.validate()?;
    let outcome = service::enroll_student(&state.db, id, enrollment).await?;
    Ok(upsert_response(
        outcome,
        "Student enrolled",
        "Enrollment reactivated",
    ))
}

async fn unenroll_student(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath((id, student_id)): ApiPath<(i64, i64)>,
) -> AppResult<ApiResponse<()>> {
    caller.require(ADMIN)?;
    service::unenroll_student(&state.db, id, student_id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Student removed from course"))
}

async fn list_subjects(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<AssignedSubject>>> {
    caller.require(ADMIN)?;
    let subjects = service::list_course_subjects(&state.db, id).await?;
    Ok(ApiResponse::list("Subjects retrieved", subjects))
}

async fn assign_subject(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<AssignSubjectRequest>, AppError>,
) -> AppResult<ApiResponse<()>> {
    caller.require(ADMIN)?;
    let JsonOrForm(request) = body?;
    let assignment = request.validate()?;
    let outcome = service::assign_subject(&state.db, id, assignment).await?;
    Ok(upsert_response(
        outcome,
        "Subject assigned to course",
        "Subject assignment reactivated",
    ))
}

async fn unassign_subject(
    State(state): State<Arc<AppState>>,
    caller: CurrentUser,
    ApiPath((id, subject_id, teacher_id)): ApiPath<(i64, i64, i64)>,
) -> AppResult<ApiResponse<()>> {
    caller.require(ADMIN)?;
    service::unassign_subject(&state.db, id, subject_id, teacher_id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Subject removed from course"))
}

//! Form views for the administration pages.
//!
//! Each view runs the same validation and service call as its API
//! counterpart and answers with a redirect plus a flash message instead of
//! JSON. Administrators only.

use std::sync::Arc;

use axum::{extract::State, response::Response, routing::post, Router};
use serde::Deserialize;

use super::extractors::{ApiPath, JsonOrForm, ViewUser, ADMIN};
use super::flash::{describe, redirect_with_error, redirect_with_flash, FlashLevel};
use super::server::AppState;
use crate::courses::{self, CreateCourseRequest, TeachingAssignment, UpdateCourseRequest};
use crate::error::{AppError, AppResult};
use crate::models::{Course, Role, Subject, User};
use crate::subjects::{self, CreateSubjectRequest, UpdateSubjectRequest};
use crate::users::{self, CreateUserRequest, UpdateUserRequest};
use crate::validation::flexible_i64;

const COURSES_PAGE: &str = "/courses";
const TEACHERS_PAGE: &str = "/users/teachers";

pub fn view_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/courses/create", post(create_course))
        .route("/courses/:id/edit", post(edit_course))
        .route("/courses/:id/delete", post(delete_course))
        .route(
            "/courses/:id/students/:student_id/remove",
            post(remove_student),
        )
        .route(
            "/courses/:id/subjects/:subject_id/:teacher_id/remove",
            post(remove_subject),
        )
        .route("/users/teachers/create", post(create_teacher))
        .route("/users/teachers/:id/edit", post(edit_teacher))
        .route("/users/teachers/:id/delete", post(delete_teacher))
        .route("/subjects/create", post(create_subject))
        .route("/subjects/:id/edit", post(edit_subject))
        .route("/subjects/:id/delete", post(delete_subject))
}

fn course_page(id: i64) -> String {
    format!("{}/{}", COURSES_PAGE, id)
}

/// Redirect to `to` with a success flash, or with the error described
fn finish<T>(result: AppResult<T>, to: &str, success: impl FnOnce(&T) -> String) -> Response {
    match result {
        Ok(value) => redirect_with_flash(to, FlashLevel::Success, &success(&value)),
        Err(err) => redirect_with_error(to, &err),
    }
}

// ==================
// Courses
// ==================

async fn create_course(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    body: Result<JsonOrForm<CreateCourseRequest>, AppError>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result: AppResult<Course> = async {
        let JsonOrForm(request) = body?;
        let input = request.validate()?;
        courses::service::create_course(&state.db, input, viewer.0.id).await
    }
    .await;
    finish(result, COURSES_PAGE, |course| {
        format!("Course '{}' created successfully", course.name)
    })
}

async fn edit_course(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<UpdateCourseRequest>, AppError>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result: AppResult<Course> = async {
        let JsonOrForm(request) = body?;
        let patch = request.validate()?;
        courses::service::update_course(&state.db, id, patch).await
    }
    .await;
    finish(result, &course_page(id), |course| {
        format!("Course '{}' updated successfully", course.name)
    })
}

async fn delete_course(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result = courses::service::delete_course(&state.db, id).await;
    finish(result, COURSES_PAGE, |_| "Course deleted successfully".to_string())
}

async fn remove_student(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath((id, student_id)): ApiPath<(i64, i64)>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result = courses::service::unenroll_student(&state.db, id, student_id).await;
    finish(result, &course_page(id), |_| {
        "Student removed from course".to_string()
    })
}

async fn remove_subject(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath((id, subject_id, teacher_id)): ApiPath<(i64, i64, i64)>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result =
        courses::service::unassign_subject(&state.db, id, subject_id, teacher_id).await;
    finish(result, &course_page(id), |_| {
        "Subject removed from course".to_string()
    })
}

// ==================
// Teachers
// ==================

/// The user behind a teacher view; other roles are not reachable here
async fn find_teacher(state: &AppState, id: i64) -> AppResult<User> {
    let user = users::service::get_user(&state.db, id).await?;
    if user.role == Role::Teacher {
        Ok(user)
    } else {
        Err(AppError::NotFound("Teacher"))
    }
}

async fn create_teacher(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    body: Result<JsonOrForm<CreateUserRequest>, AppError>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result: AppResult<User> = async {
        let JsonOrForm(mut request) = body?;
        request.role = Some(Role::Teacher.as_str().to_string());
        let input = request.validate()?;
        users::service::create_user(&state.db, input).await
    }
    .await;
    finish(result, TEACHERS_PAGE, |teacher| {
        format!("Teacher '{}' created successfully", teacher.display_name())
    })
}

async fn edit_teacher(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<UpdateUserRequest>, AppError>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result: AppResult<User> = async {
        let JsonOrForm(mut request) = body?;
        request.role = None;
        request.is_active = None;
        let patch = request.validate()?;
        find_teacher(&state, id).await?;
        users::service::update_user(&state.db, id, patch).await
    }
    .await;
    finish(result, TEACHERS_PAGE, |teacher| {
        format!("Teacher '{}' updated successfully", teacher.display_name())
    })
}

async fn delete_teacher(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result: AppResult<User> = async {
        let teacher = find_teacher(&state, id).await?;
        users::service::delete_user(&state.db, id).await?;
        Ok(teacher)
    }
    .await;
    finish(result, TEACHERS_PAGE, |teacher| {
        format!("Teacher '{}' deleted successfully", teacher.display_name())
    })
}

// ==================
// Subjects
// ==================

/// Subject form; `course_id` also assigns the new subject to that course
#[derive(Debug, Default, Deserialize)]
struct SubjectForm {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    teacher_id: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    course_id: Option<i64>,
}

async fn create_subject(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    body: Result<JsonOrForm<SubjectForm>, AppError>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result: AppResult<(Subject, Option<i64>)> = async {
        let JsonOrForm(form) = body?;
        let input = CreateSubjectRequest {
            name: form.name,
            teacher_id: form.teacher_id,
        }
        .validate()?;
        let subject = subjects::service::create_subject(&state.db, input).await?;
        Ok((subject, form.course_id))
    }
    .await;

    let (subject, course_id) = match result {
        Ok(created) => created,
        Err(err) => return redirect_with_error(COURSES_PAGE, &err),
    };
    let Some(course_id) = course_id else {
        return redirect_with_flash(
            COURSES_PAGE,
            FlashLevel::Success,
            &format!("Subject '{}' created successfully", subject.name),
        );
    };

    let assignment = TeachingAssignment {
        subject_id: subject.id,
        teacher_id: subject.teacher_id,
        is_active: true,
    };
    match courses::service::assign_subject(&state.db, course_id, assignment).await {
        Ok(_) => redirect_with_flash(
            &course_page(course_id),
            FlashLevel::Success,
            &format!("Subject '{}' created and assigned to the course", subject.name),
        ),
        Err(err) => redirect_with_flash(
            COURSES_PAGE,
            FlashLevel::Warning,
            &format!(
                "Subject '{}' created but not assigned to the course: {}",
                subject.name,
                describe(&err)
            ),
        ),
    }
}

async fn edit_subject(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<JsonOrForm<UpdateSubjectRequest>, AppError>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result: AppResult<Subject> = async {
        let JsonOrForm(request) = body?;
        let patch = request.validate()?;
        subjects::service::update_subject(&state.db, id, patch).await
    }
    .await;
    finish(result, COURSES_PAGE, |subject| {
        format!("Subject '{}' updated successfully", subject.name)
    })
}

async fn delete_subject(
    State(state): State<Arc<AppState>>,
    viewer: ViewUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    if let Err(redirect) = viewer.require(ADMIN) {
        return redirect;
    }
    let result = subjects::service::delete_subject(&state.db, id).await;
    finish(result, COURSES_PAGE, |_| "Subject deleted successfully".to_string())
}

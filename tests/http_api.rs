//! HTTP API Tests
//!
//! End-to-end checks of authentication, role gating, the response envelope
//! and the form views, driven through the full router.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::json;

use campus::models::Role;
use common::{flash, location, set_cookies, TestApp, BOOTSTRAP_SECRET, PASSWORD};

fn sexto_a() -> serde_json::Value {
    json!({
        "academic_year": "2024-2025",
        "period": 1,
        "grade_level": "Sexto",
        "name": "Sexto A"
    })
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_health_reports_healthy() {
    let app = TestApp::new().await;
    let (status, body) = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_issues_tokens_and_rejects_wrong_password() {
    let app = TestApp::new().await;
    let teacher = app.account("tom", Role::Teacher).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "tom", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");
    assert_eq!(body["status_code"], 401);

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "tom", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "bearer");
    assert_eq!(body["data"]["user"]["id"], teacher.id);
    assert!(body["data"]["refresh_token"].is_string());

    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let (status, me) = app.json(Method::GET, "/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["username"], "tom");
    assert_eq!(me["data"]["role"], "TEACHER");

    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();
    let (status, refreshed) = app
        .json(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({"refresh_token": refresh})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["data"]["access_token"].is_string());
    assert!(refreshed["data"].get("refresh_token").is_none());

    // An access token is not a refresh token
    let (status, _) = app
        .json(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({"refresh_token": access})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_or_missing_token_is_unauthenticated() {
    let app = TestApp::new().await;
    let admin = app.account("root", Role::Admin).await;

    let parts: Vec<&str> = admin.token.split('.').collect();
    let signature = parts[2];
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}.{}{}", parts[0], parts[1], flipped, &signature[1..]);

    let (status, body) = app
        .json(Method::GET, "/api/courses", Some(&tampered), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");

    let (status, _) = app.json(Method::GET, "/api/courses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_form_login_sets_cookies_and_redirects() {
    let app = TestApp::new().await;
    app.account("root", Role::Admin).await;

    let response = app
        .form("/auth/login", None, &format!("username=root&password={}", PASSWORD))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/dashboard");

    let cookies = set_cookies(&response);
    let access = cookies
        .iter()
        .find(|c| c.starts_with("access_token_cookie="))
        .unwrap();
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("Path=/;"));
    let refresh = cookies
        .iter()
        .find(|c| c.starts_with("refresh_token_cookie="))
        .unwrap();
    assert!(refresh.contains("Path=/auth/refresh"));
    assert!(flash(&response).unwrap().starts_with("success|"));

    let failed = app
        .form("/auth/login", None, "username=root&password=nope")
        .await;
    assert_eq!(failed.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&failed), "/auth/login");
    assert!(flash(&failed).unwrap().starts_with("danger|"));
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::post("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
    let cleared: Vec<_> = set_cookies(&response)
        .into_iter()
        .filter(|c| c.contains("Max-Age=0"))
        .collect();
    assert_eq!(cleared.len(), 2);
}

#[tokio::test]
async fn test_first_admin_bootstrap() {
    let app = TestApp::new().await;
    let request = |secret: &str| {
        json!({
            "username": "principal",
            "password": "s3cret-pass",
            "full_name": "The Principal",
            "secret_key": secret
        })
    };

    let (status, _) = app
        .json(Method::POST, "/auth/first-admin", None, Some(request("guess")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/first-admin",
            None,
            Some(request(BOOTSTRAP_SECRET)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "ADMIN");

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/first-admin",
            None,
            Some(request(BOOTSTRAP_SECRET)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CONFLICT");
}

// =============================================================================
// Role gating
// =============================================================================

#[tokio::test]
async fn test_teacher_cannot_use_admin_endpoints() {
    let app = TestApp::new().await;
    let teacher = app.account("tom", Role::Teacher).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/courses",
            Some(&teacher.token),
            Some(sexto_a()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = app
        .json(Method::GET, "/api/users", Some(&teacher.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_check_precedes_body_parsing() {
    let app = TestApp::new().await;
    let teacher = app.account("tom", Role::Teacher).await;
    let admin = app.account("root", Role::Admin).await;

    let malformed = |token: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/courses")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap()
    };

    let response = app.send(malformed(&teacher.token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(malformed(&admin.token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_users_may_read_themselves_but_not_promote() {
    let app = TestApp::new().await;
    let student = app.account("sam", Role::Student).await;
    let other = app.account("sue", Role::Student).await;

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/users/{}", student.id),
            Some(&student.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("hashed_password").is_none());

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/api/users/{}", other.id),
            Some(&student.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(
            Method::PATCH,
            &format!("/api/users/{}", student.id),
            Some(&student.token),
            Some(json!({"role": "ADMIN"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            Method::PATCH,
            &format!("/api/users/{}", student.id),
            Some(&student.token),
            Some(json!({"full_name": "Samuel"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["full_name"], "Samuel");
}

// =============================================================================
// Courses
// =============================================================================

#[tokio::test]
async fn test_duplicate_active_course_is_conflict() {
    let app = TestApp::new().await;
    let admin = app.account("root", Role::Admin).await;

    let (status, body) = app
        .json(Method::POST, "/api/courses", Some(&admin.token), Some(sexto_a()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Sexto A");

    let (status, body) = app
        .json(Method::POST, "/api/courses", Some(&admin.token), Some(sexto_a()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CONFLICT");

    let (status, body) = app
        .json(Method::GET, "/api/courses", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_invalid_course_reports_field_details() {
    let app = TestApp::new().await;
    let admin = app.account("root", Role::Admin).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/courses",
            Some(&admin.token),
            Some(json!({"academic_year": "2024", "period": 7, "grade_level": "Primero", "name": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    for field in ["academic_year", "period", "grade_level", "name"] {
        assert!(fields.contains(&field), "missing {}", field);
    }
}

// =============================================================================
// Content
// =============================================================================

#[tokio::test]
async fn test_grading_missing_submission_is_not_found() {
    let app = TestApp::new().await;
    let teacher = app.account("tom", Role::Teacher).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/submissions/999/grade",
            Some(&teacher.token),
            Some(json!({"score": 80})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_assignment_submission_flow() {
    let app = TestApp::new().await;
    let teacher = app.account("tom", Role::Teacher).await;
    let student = app.account("sam", Role::Student).await;

    let (status, open) = app
        .json(
            Method::POST,
            "/api/assignments",
            Some(&teacher.token),
            Some(json!({
                "title": "Essay",
                "description": "Two pages",
                "due_date": (Utc::now() + Duration::days(3)).to_rfc3339()
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let open_id = open["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/api/assignments/{}/submit", open_id),
            Some(&teacher.token),
            Some(json!({"content": "teachers do not submit"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, submitted) = app
        .json(
            Method::POST,
            &format!("/api/assignments/{}/submit", open_id),
            Some(&student.token),
            Some(json!({"content": "My essay"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let submission_id = submitted["data"]["id"].as_i64().unwrap();

    let (status, graded) = app
        .json(
            Method::POST,
            &format!("/api/submissions/{}/grade", submission_id),
            Some(&teacher.token),
            Some(json!({"score": 92.5, "feedback": "Well argued"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["data"]["score"], 92.5);

    let (_, closed) = app
        .json(
            Method::POST,
            "/api/assignments",
            Some(&teacher.token),
            Some(json!({
                "title": "Late essay",
                "due_date": (Utc::now() - Duration::days(1)).to_rfc3339()
            })),
        )
        .await;
    let closed_id = closed["data"]["id"].as_i64().unwrap();
    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/assignments/{}/submit", closed_id),
            Some(&student.token),
            Some(json!({"content": "too late"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_exercise_is_scored_on_submit() {
    let app = TestApp::new().await;
    let teacher = app.account("tom", Role::Teacher).await;
    let student = app.account("sam", Role::Student).await;

    let (status, exercise) = app
        .json(
            Method::POST,
            "/api/exercises",
            Some(&teacher.token),
            Some(json!({
                "title": "Quiz",
                "questions": {
                    "q1": {"text": "2+2", "correct_answer": "4"},
                    "q2": {"text": "3+3", "correct_answer": "6"}
                },
                "time_limit": 10
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = exercise["data"]["id"].as_i64().unwrap();

    let (status, submission) = app
        .json(
            Method::POST,
            &format!("/api/exercises/{}/submit", id),
            Some(&student.token),
            Some(json!({"answers": {"q1": "4", "q2": "7"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submission["data"]["score"], 50.0);
}

#[tokio::test]
async fn test_document_update_requires_author() {
    let app = TestApp::new().await;
    let author = app.account("tom", Role::Teacher).await;
    let other = app.account("ana", Role::Teacher).await;

    let (status, doc) = app
        .json(
            Method::POST,
            "/api/documents",
            Some(&author.token),
            Some(json!({"title": "Syllabus", "content": "Week 1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/documents/{}", doc["data"]["id"]);

    let (status, body) = app
        .json(
            Method::PUT,
            &uri,
            Some(&other.token),
            Some(json!({"title": "Mine now", "content": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = app.json(Method::DELETE, &uri, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.json(Method::GET, &uri, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Classes
// =============================================================================

#[tokio::test]
async fn test_resource_extension_allow_list() {
    let app = TestApp::new().await;
    let admin = app.account("root", Role::Admin).await;
    let teacher = app.account("tom", Role::Teacher).await;

    let (_, course) = app
        .json(Method::POST, "/api/courses", Some(&admin.token), Some(sexto_a()))
        .await;
    let course_id = course["data"]["id"].as_i64().unwrap();
    let (_, subject) = app
        .json(
            Method::POST,
            "/api/subjects",
            Some(&admin.token),
            Some(json!({"name": "Science", "teacher_id": teacher.id})),
        )
        .await;
    let subject_id = subject["data"]["id"].as_i64().unwrap();

    let (status, class) = app
        .json(
            Method::POST,
            &format!("/api/courses/{}/classes", course_id),
            Some(&teacher.token),
            Some(json!({
                "subject_id": subject_id,
                "title": "Cells",
                "class_number": 1,
                "date": "2025-02-03"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let resources = format!("/api/classes/{}/resources", class["data"]["id"]);

    let (status, body) = app
        .json(
            Method::POST,
            &resources,
            Some(&teacher.token),
            Some(json!({"title": "Script", "url": "setup.exe"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = app
        .json(
            Method::POST,
            &resources,
            Some(&teacher.token),
            Some(json!({"title": "Diagram", "url": "cell.png"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.json(Method::GET, &resources, Some(&teacher.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}

// =============================================================================
// Form views
// =============================================================================

#[tokio::test]
async fn test_course_view_redirects_with_flash() {
    let app = TestApp::new().await;
    let admin = app.account("root", Role::Admin).await;
    let form = "academic_year=2024-2025&period=1&grade_level=Sexto&name=Sexto+A";

    let created = app.form("/courses/create", Some(&admin.token), form).await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&created), "/courses");
    assert!(flash(&created).unwrap().starts_with("success|"));

    let duplicate = app.form("/courses/create", Some(&admin.token), form).await;
    assert_eq!(duplicate.status(), StatusCode::SEE_OTHER);
    assert!(!flash(&duplicate).unwrap().starts_with("success|"));

    assert_eq!(app.count("SELECT COUNT(*) FROM courses").await, 1);
}

#[tokio::test]
async fn test_views_redirect_unauthenticated_and_wrong_role() {
    let app = TestApp::new().await;
    let teacher = app.account("tom", Role::Teacher).await;

    let anonymous = app.form("/subjects/create", None, "name=Art").await;
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&anonymous), "/auth/login");
    assert!(flash(&anonymous).unwrap().starts_with("warning|"));

    let forbidden = app
        .form("/subjects/create", Some(&teacher.token), "name=Art")
        .await;
    assert_eq!(forbidden.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&forbidden), "/admin/dashboard");
    assert!(flash(&forbidden).unwrap().starts_with("danger|"));
}

#[tokio::test]
async fn test_teacher_views_force_teacher_role() {
    let app = TestApp::new().await;
    let admin = app.account("root", Role::Admin).await;

    let response = app
        .form(
            "/users/teachers/create",
            Some(&admin.token),
            "username=ana&document=1234&password=secret123&full_name=Ana&role=ADMIN",
        )
        .await;
    assert_eq!(location(&response), "/users/teachers");
    assert!(flash(&response).unwrap().starts_with("success|"));

    let (_, users) = app
        .json(Method::GET, "/api/users?role=TEACHER", Some(&admin.token), None)
        .await;
    assert_eq!(users["total"], 1);
    assert_eq!(users["data"][0]["username"], "ana");

    // The admin account is not reachable through the teacher views
    let response = app
        .form(
            &format!("/users/teachers/{}/delete", admin.id),
            Some(&admin.token),
            "",
        )
        .await;
    assert!(flash(&response).unwrap().starts_with("danger|"));
}

#[tokio::test]
async fn test_bearer_header_takes_precedence_over_cookie() {
    let app = TestApp::new().await;
    let admin = app.account("root", Role::Admin).await;
    let student = app.account("sam", Role::Student).await;

    let response = app
        .send(
            Request::get("/api/courses")
                .header(header::AUTHORIZATION, format!("Bearer {}", admin.token))
                .header(header::COOKIE, format!("access_token_cookie={}", student.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

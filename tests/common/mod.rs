//! Shared harness for the HTTP integration suites: a file-backed database
//! in a temp dir and the full router driven through `oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use campus::config::AppConfig;
use campus::db::Database;
use campus::http_server::{build_router, AppState};
use campus::models::Role;
use campus::users::{service as users, NewUser};

pub const PASSWORD: &str = "secret123";
pub const BOOTSTRAP_SECRET: &str = "let-me-in";

pub struct TestApp {
    pub state: Arc<AppState>,
    router: Router,
    _dir: TempDir,
}

/// A seeded account and a valid access token for it
pub struct Account {
    pub id: i64,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret-0123456789".into();
        config.auth.first_admin_secret = Some(BOOTSTRAP_SECRET.into());
        config.database.url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("campus.db").display()
        );
        config.validate().unwrap();

        let db = Database::connect(&config.database).await.unwrap();
        db.migrate().await.unwrap();
        let state = Arc::new(AppState::new(db, config));
        let router = build_router(state.clone());
        Self {
            state,
            router,
            _dir: dir,
        }
    }

    pub async fn account(&self, username: &str, role: Role) -> Account {
        let user = users::create_user(
            &self.state.db,
            NewUser {
                username: username.to_string(),
                document: format!("doc-{}", username),
                password: PASSWORD.to_string(),
                full_name: None,
                role,
            },
        )
        .await
        .unwrap();
        let token = self
            .state
            .jwt
            .generate_access_token(user.id, user.role)
            .unwrap();
        Account { id: user.id, token }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// JSON request; returns the status and the parsed body
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// URL-encoded form post authenticated through the access cookie
    pub async fn form(&self, uri: &str, token: Option<&str>, body: &str) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("access_token_cookie={}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(sql)
            .fetch_one(self.state.db.pool())
            .await
            .unwrap();
        count
    }
}

/// Every `Set-Cookie` header of a response
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Decoded `level|message` of the flash cookie, if any
pub fn flash(response: &Response) -> Option<String> {
    set_cookies(response).into_iter().find_map(|cookie| {
        let value = cookie.strip_prefix("flash=")?;
        let value = value.split(';').next()?;
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

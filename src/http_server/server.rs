//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers around one shared
//! [`AppState`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::auth_routes::auth_routes;
use super::class_routes::class_routes;
use super::config::HttpServerConfig;
use super::content_routes::content_routes;
use super::course_routes::course_routes;
use super::observability_routes::health_routes;
use super::subject_routes::subject_routes;
use super::user_routes::user_routes;
use super::view_routes::view_routes;
use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::db::Database;
use crate::error::AppError;

/// State shared by every handler
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Self {
            jwt: JwtManager::new(config.auth.jwt_config()),
            db,
            config,
        }
    }
}

/// HTTP server for the campus API and form views
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(state: Arc<AppState>) -> Self {
        let config = state.config.server.clone();
        let router = build_router(state);
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), err),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "campus HTTP server listening");
        tracing::info!("health check: http://{}/health", addr);

        axum::serve(listener, self.router).await
    }
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        // No origins configured: permissive for development
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route")
}

/// Build the combined router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.uploads.max_bytes;
    let cors = cors_layer(&state.config.server);

    let api = Router::new()
        .merge(user_routes())
        .merge(course_routes())
        .merge(subject_routes())
        .merge(content_routes())
        .merge(class_routes());

    Router::new()
        .merge(health_routes())
        .nest("/auth", auth_routes())
        .nest("/api", api)
        .merge(view_routes())
        .fallback(route_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn state(config: AppConfig) -> Arc<AppState> {
        let db = Database::in_memory().await.unwrap();
        Arc::new(AppState::new(db, config))
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "a-test-secret-of-decent-length".into();
        config
    }

    #[tokio::test]
    async fn test_server_with_custom_port() {
        let mut config = config();
        config.server = HttpServerConfig::with_port(8080);
        let server = HttpServer::new(state(config).await);
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_envelope() {
        let router = build_router(state(config()).await);
        let response = router
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = config();
        config.uploads.max_bytes = 64;
        let router = build_router(state(config).await);
        let response = router
            .oneshot(
                Request::post("/auth/login")
                    .header("content-type", "application/json")
                    .header("content-length", "1024")
                    .body(Body::from(vec![b' '; 1024]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}

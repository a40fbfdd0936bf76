//! # HTTP Server Module
//!
//! axum server exposing the campus JSON API and the administration form
//! views.
//!
//! # Endpoints
//!
//! - `/health` - Liveness, including a database ping
//! - `/auth/*` - Login, refresh, identity, logout, first-admin bootstrap
//! - `/api/*` - Users, courses, subjects, coursework, classes
//! - `/courses/*`, `/users/teachers/*`, `/subjects/*` - Form views

pub mod config;
pub mod extractors;
pub mod flash;
pub mod response;
pub mod server;

mod auth_routes;
mod class_routes;
mod content_routes;
mod course_routes;
mod observability_routes;
mod subject_routes;
mod user_routes;
mod view_routes;

pub use config::HttpServerConfig;
pub use response::ApiResponse;
pub use server::{build_router, AppState, HttpServer};

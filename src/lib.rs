//! campus - school management backend
//!
//! Courses, subjects, enrollments and coursework behind a JSON API and a
//! set of administration form views, with JWT authentication and three
//! roles (ADMIN, TEACHER, STUDENT).

pub mod auth;
pub mod classes;
pub mod cli;
pub mod config;
pub mod content;
pub mod courses;
pub mod db;
pub mod error;
pub mod http_server;
pub mod models;
pub mod subjects;
pub mod users;
pub mod validation;

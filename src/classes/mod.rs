//! # Classes
//!
//! Numbered class sessions of a subject within a course, with attached
//! resources.

pub mod schema;
pub mod service;

pub use schema::{CreateClassRequest, CreateResourceRequest, NewClass, NewResource};

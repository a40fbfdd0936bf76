//! # Subjects

pub mod schema;
pub mod service;

pub use schema::{CreateSubjectRequest, NewSubject, SubjectListQuery, SubjectPatch, UpdateSubjectRequest};

//! # Entity Model
//!
//! Typed records mapped 1:1 to database tables. Every row type derives
//! `sqlx::FromRow`; serialization never exposes password hashes.

mod class;
mod content;
mod course;
mod subject;
mod user;

pub use class::{Class, Resource};
pub use content::{Assignment, Document, Exercise, Submission};
pub use course::{Course, CourseStudent, CourseSubject, GradeLevel};
pub use subject::Subject;
pub use user::{Role, User};

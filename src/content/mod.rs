//! # Content
//!
//! Author-owned coursework: assignments, auto-graded exercises, documents
//! and the submissions students make against them.

pub mod assignments;
pub mod documents;
pub mod exercises;
pub mod schema;
pub mod submissions;

pub use schema::{
    CreateAssignmentRequest, CreateExerciseRequest, DocumentInput, DocumentRequest, Grade,
    GradeSubmissionRequest, NewAssignment, NewExercise, SubmitAssignmentRequest,
    SubmitExerciseRequest,
};

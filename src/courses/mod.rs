//! # Courses
//!
//! Courses, student enrollments and subject/teacher assignments.

pub mod schema;
pub mod service;

pub use schema::{
    AssignSubjectRequest, CourseFilter, CourseListQuery, CoursePatch, CreateCourseRequest,
    EnrollStudentRequest, Enrollment, NewCourse, TeachingAssignment, UpdateCourseRequest,
};
pub use service::{AssignedSubject, EnrolledStudent, Upsert};

//! Request contracts for courses, enrollments and teaching assignments.

use serde::Deserialize;

use crate::models::GradeLevel;
use crate::validation::{flexible_bool, flexible_i64, is_academic_year, non_blank, ValidationErrors};

const PERIODS: std::ops::RangeInclusive<i64> = 1..=3;

fn check_academic_year(errors: &mut ValidationErrors, value: &str) {
    if !is_academic_year(value) {
        errors.add("academic_year", "must have the format YYYY-YYYY");
    }
}

fn check_period(errors: &mut ValidationErrors, value: i64) {
    if !PERIODS.contains(&value) {
        errors.add("period", "must be 1, 2 or 3");
    }
}

fn parse_grade(errors: &mut ValidationErrors, value: &str) -> Option<GradeLevel> {
    match value.parse::<GradeLevel>() {
        Ok(grade) => Some(grade),
        Err(reason) => {
            errors.add("grade_level", reason);
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub academic_year: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub period: Option<i64>,
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub academic_year: String,
    pub period: i64,
    pub grade_level: GradeLevel,
    pub name: String,
}

impl CreateCourseRequest {
    pub fn validate(self) -> Result<NewCourse, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let academic_year = self.academic_year.trim().to_string();
        let name = self.name.trim().to_string();

        check_academic_year(&mut errors, &academic_year);
        match self.period {
            Some(period) => check_period(&mut errors, period),
            None => errors.add("period", "is required"),
        }
        let grade_level = parse_grade(&mut errors, self.grade_level.trim());
        errors.length("name", &name, 1, 100);

        match (self.period, grade_level) {
            (Some(period), Some(grade_level)) if errors.is_empty() => Ok(NewCourse {
                academic_year,
                period,
                grade_level,
                name,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub period: Option<i64>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub academic_year: Option<String>,
    pub period: Option<i64>,
    pub grade_level: Option<GradeLevel>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateCourseRequest {
    pub fn validate(self) -> Result<CoursePatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let academic_year = non_blank(self.academic_year);
        let name = self.name.map(|n| n.trim().to_string());

        if let Some(year) = &academic_year {
            check_academic_year(&mut errors, year);
        }
        if let Some(period) = self.period {
            check_period(&mut errors, period);
        }
        let grade_level = match non_blank(self.grade_level) {
            Some(raw) => parse_grade(&mut errors, &raw),
            None => None,
        };
        errors.optional_length("name", name.as_deref(), 1, 100);

        errors.into_result()?;
        Ok(CoursePatch {
            academic_year,
            period: self.period,
            grade_level,
            name,
            is_active: self.is_active,
        })
    }
}

/// Filters of the course listing; only active courses unless `is_active`
/// says otherwise
#[derive(Debug, Default, Deserialize)]
pub struct CourseListQuery {
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub period: Option<i64>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub academic_year: Option<String>,
    pub period: Option<i64>,
    pub grade_level: Option<GradeLevel>,
    pub is_active: bool,
}

impl CourseListQuery {
    pub fn validate(self) -> Result<CourseFilter, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let grade_level = match non_blank(self.grade_level) {
            Some(raw) => parse_grade(&mut errors, &raw),
            None => None,
        };
        errors.into_result()?;
        Ok(CourseFilter {
            academic_year: non_blank(self.academic_year),
            period: self.period,
            grade_level,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// `POST /api/courses/:id/students`
#[derive(Debug, Default, Deserialize)]
pub struct EnrollStudentRequest {
    #[serde(default, deserialize_with = "flexible_i64")]
    pub student_id: Option<i64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct Enrollment {
    pub student_id: i64,
    pub is_active: bool,
}

impl EnrollStudentRequest {
    pub fn validate(self) -> Result<Enrollment, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match self.student_id {
            Some(id) => errors.positive_id("student_id", id),
            None => errors.add("student_id", "is required"),
        }
        errors.into_result()?;
        Ok(Enrollment {
            student_id: self.student_id.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// `POST /api/courses/:id/subjects`
#[derive(Debug, Default, Deserialize)]
pub struct AssignSubjectRequest {
    #[serde(default, deserialize_with = "flexible_i64")]
    pub subject_id: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub teacher_id: Option<i64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct TeachingAssignment {
    pub subject_id: i64,
    pub teacher_id: i64,
    pub is_active: bool,
}

impl AssignSubjectRequest {
    pub fn validate(self) -> Result<TeachingAssignment, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match self.subject_id {
            Some(id) => errors.positive_id("subject_id", id),
            None => errors.add("subject_id", "is required"),
        }
        match self.teacher_id {
            Some(id) => errors.positive_id("teacher_id", id),
            None => errors.add("teacher_id", "is required"),
        }
        errors.into_result()?;
        Ok(TeachingAssignment {
            subject_id: self.subject_id.unwrap_or_default(),
            teacher_id: self.teacher_id.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

// src/catalog.rs

//! Client-side style filtering of the exam catalog.
//!
//! Every criterion is optional and an empty string counts as absent, so the
//! default filter matches everything. Criteria combine with AND.

use serde::Deserialize;

use crate::models::exam::Exam;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamFilter {
    /// Case-insensitive substring of the course name. No accent folding.
    pub course: Option<String>,
    pub exam_type: Option<String>,
    pub cycle: Option<String>,
    pub period: Option<String>,
    /// Compared against the year's decimal string form.
    pub year: Option<String>,
}

fn criterion(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ExamFilter {
    pub fn is_empty(&self) -> bool {
        criterion(&self.course).is_none()
            && criterion(&self.exam_type).is_none()
            && criterion(&self.cycle).is_none()
            && criterion(&self.period).is_none()
            && criterion(&self.year).is_none()
    }

    pub fn matches(&self, exam: &Exam) -> bool {
        if let Some(course) = criterion(&self.course) {
            if !exam.course.to_lowercase().contains(&course.to_lowercase()) {
                return false;
            }
        }
        if let Some(exam_type) = criterion(&self.exam_type) {
            if exam.exam_type.as_str() != exam_type {
                return false;
            }
        }
        if let Some(cycle) = criterion(&self.cycle) {
            if exam.cycle != cycle {
                return false;
            }
        }
        if let Some(period) = criterion(&self.period) {
            if exam.period.as_str() != period {
                return false;
            }
        }
        if let Some(year) = criterion(&self.year) {
            if exam.year.to_string() != year {
                return false;
            }
        }
        true
    }

    /// Keeps the matching exams, preserving their order.
    pub fn apply(&self, exams: Vec<Exam>) -> Vec<Exam> {
        if self.is_empty() {
            return exams;
        }
        exams.into_iter().filter(|e| self.matches(e)).collect()
    }
}

/// Distinct years present in the catalog, newest first.
pub fn available_years(exams: &[Exam]) -> Vec<i32> {
    let mut years: Vec<i32> = exams.iter().map(|e| e.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

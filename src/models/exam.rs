// src/models/exam.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamType {
    Partial,
    Final,
    Substitute,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Partial => "Partial",
            ExamType::Final => "Final",
            ExamType::Substitute => "Substitute",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Partial" => Ok(ExamType::Partial),
            "Final" => Ok(ExamType::Final),
            "Substitute" => Ok(ExamType::Substitute),
            other => Err(format!("Unknown exam type '{}'", other)),
        }
    }
}

/// Academic period within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    I,
    II,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::I => "I",
            Period::II => "II",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Period::I),
            "II" => Ok(Period::II),
            other => Err(format!("Unknown period '{}'", other)),
        }
    }
}

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub course: String,
    pub exam_type: ExamType,

    /// Free-form cycle label, e.g. "6 ciclo".
    pub cycle: String,
    pub year: i32,
    pub period: Period,

    /// Object key inside the storage bucket.
    pub file_path: String,

    /// Public link to the stored PDF, used by the preview viewer.
    pub file_url: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row data for a new exam, after its PDF has been stored.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub course: String,
    pub exam_type: ExamType,
    pub cycle: String,
    pub year: i32,
    pub period: Period,
    pub file_path: String,
    pub file_url: String,
}

/// Partial update of an exam. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ExamChanges {
    pub course: Option<String>,
    pub exam_type: Option<ExamType>,
    pub cycle: Option<String>,
    pub year: Option<i32>,
    pub period: Option<Period>,

    /// New `(file_path, file_url)` pair once a replacement PDF is uploaded.
    pub file: Option<(String, String)>,
}

impl ExamChanges {
    pub fn is_empty(&self) -> bool {
        self.course.is_none()
            && self.exam_type.is_none()
            && self.cycle.is_none()
            && self.year.is_none()
            && self.period.is_none()
            && self.file.is_none()
    }

    pub fn apply_to(self, exam: &mut Exam) {
        if let Some(course) = self.course {
            exam.course = course;
        }
        if let Some(exam_type) = self.exam_type {
            exam.exam_type = exam_type;
        }
        if let Some(cycle) = self.cycle {
            exam.cycle = cycle;
        }
        if let Some(year) = self.year {
            exam.year = year;
        }
        if let Some(period) = self.period {
            exam.period = period;
        }
        if let Some((path, url)) = self.file {
            exam.file_path = path;
            exam.file_url = url;
        }
    }
}

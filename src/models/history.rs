// src/models/history.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::exam::Exam;

/// Represents the 'download_history' table. One row per (user, exam).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub student_email: String,
    pub download_count: i64,
    pub last_downloaded_at: chrono::DateTime<chrono::Utc>,
}

/// Returned by the download endpoint; the client opens `file_url`.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub exam_id: i64,
    pub file_url: String,
    pub download_count: i64,
    pub last_downloaded_at: chrono::DateTime<chrono::Utc>,
}

/// One row of the reconciled history view.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub exam: Exam,
    pub download_count: i64,
    pub last_downloaded_at: chrono::DateTime<chrono::Utc>,

    /// The user's rating, if any.
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Distinct exams in the history, before any filter.
    pub downloaded_exams: usize,
    pub total_downloads: i64,
    pub rated_exams: usize,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntry>,
    pub summary: HistorySummary,
}

// src/reconcile.rs

//! Builds a student's download history view from three independent reads:
//! the exam catalog, the student's download rows and the student's feedback.

use std::{cmp::Ordering, collections::HashMap};

use serde::Deserialize;

use crate::{
    catalog::ExamFilter,
    models::{
        exam::Exam,
        feedback::Feedback,
        history::{DownloadRecord, HistoryEntry, HistorySummary},
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySort {
    #[default]
    LastDownload,
    Course,
    Downloads,
    Rating,
}

/// Inner join of history rows with exams on exam id, with feedback attached
/// by exam id. History rows whose exam no longer exists are dropped.
pub fn merge(exams: Vec<Exam>, history: &[DownloadRecord], feedback: &[Feedback]) -> Vec<HistoryEntry> {
    let downloads: HashMap<i64, &DownloadRecord> = history.iter().map(|h| (h.exam_id, h)).collect();
    let ratings: HashMap<i64, &Feedback> = feedback.iter().map(|f| (f.exam_id, f)).collect();

    exams
        .into_iter()
        .filter_map(|exam| {
            let record = downloads.get(&exam.id)?;
            let fb = ratings.get(&exam.id);
            Some(HistoryEntry {
                download_count: record.download_count,
                last_downloaded_at: record.last_downloaded_at,
                rating: fb.map(|f| f.rating),
                comment: fb.map(|f| f.comment.clone()),
                exam,
            })
        })
        .collect()
}

fn compare(a: &HistoryEntry, b: &HistoryEntry, sort: HistorySort) -> Ordering {
    match sort {
        HistorySort::LastDownload => b.last_downloaded_at.cmp(&a.last_downloaded_at),
        HistorySort::Course => a
            .exam
            .course
            .to_lowercase()
            .cmp(&b.exam.course.to_lowercase()),
        HistorySort::Downloads => b.download_count.cmp(&a.download_count),
        // unrated sorts as 0
        HistorySort::Rating => b.rating.unwrap_or(0).cmp(&a.rating.unwrap_or(0)),
    }
}

/// Filters with the catalog criteria, then stable-sorts by `sort`.
pub fn arrange(entries: Vec<HistoryEntry>, filter: &ExamFilter, sort: HistorySort) -> Vec<HistoryEntry> {
    let mut out: Vec<HistoryEntry> = entries.into_iter().filter(|e| filter.matches(&e.exam)).collect();
    out.sort_by(|a, b| compare(a, b, sort));
    out
}

pub fn summarize(entries: &[HistoryEntry]) -> HistorySummary {
    let total_downloads = entries.iter().map(|e| e.download_count).sum();
    let rated: Vec<i16> = entries.iter().filter_map(|e| e.rating).filter(|r| *r > 0).collect();
    let average_rating = if rated.is_empty() {
        0.0
    } else {
        rated.iter().map(|r| f64::from(*r)).sum::<f64>() / rated.len() as f64
    };

    HistorySummary {
        downloaded_exams: entries.len(),
        total_downloads,
        rated_exams: rated.len(),
        average_rating,
    }
}

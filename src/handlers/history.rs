// src/handlers/history.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    catalog::ExamFilter,
    error::AppError,
    models::history::{DownloadResponse, HistoryView},
    reconcile::{self, HistorySort},
    state::AppState,
    utils::jwt::Claims,
};

/// Query parameters for the history view: the catalog filter plus a sort key.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(flatten)]
    pub filter: ExamFilter,
    #[serde(default)]
    pub sort: HistorySort,
}

/// Registers a download and hands back the file link for the client to open.
pub async fn download_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let exam = state
        .store
        .get_exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let record = state
        .store
        .record_download(user_id, exam.id, &claims.email, chrono::Utc::now())
        .await?;
    state.history_cache.invalidate(user_id).await;

    tracing::debug!(
        "User {} downloaded exam {} ({} times)",
        user_id,
        exam.id,
        record.download_count
    );

    Ok(Json(DownloadResponse {
        exam_id: exam.id,
        file_url: exam.file_url,
        download_count: record.download_count,
        last_downloaded_at: record.last_downloaded_at,
    }))
}

/// The student's downloaded exams with counts and ratings, filtered and sorted.
pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let (exams, history) = tokio::join!(
        state.store.list_exams(),
        state
            .history_cache
            .get_or_load(user_id, || state.store.list_downloads(user_id)),
    );
    let (exams, history) = (exams?, history?);

    let feedback = state.store.list_feedback(user_id).await?;

    let merged = reconcile::merge(exams, &history, &feedback);
    let summary = reconcile::summarize(&merged);
    let entries = reconcile::arrange(merged, &params.filter, params.sort);

    Ok(Json(HistoryView { entries, summary }))
}

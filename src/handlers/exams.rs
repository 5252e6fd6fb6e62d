// src/handlers/exams.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    catalog::{ExamFilter, available_years},
    error::AppError,
    store::Store,
};

/// Lists the catalog, optionally narrowed by course, type, cycle, period and year.
/// Available to both roles.
pub async fn list_exams(
    State(store): State<Arc<dyn Store>>,
    Query(filter): Query<ExamFilter>,
) -> Result<impl IntoResponse, AppError> {
    let exams = store.list_exams().await?;
    Ok(Json(filter.apply(exams)))
}

/// Retrieves a single exam for preview.
pub async fn get_exam(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = store
        .get_exam(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(exam))
}

/// Distinct exam years, newest first.
pub async fn list_years(State(store): State<Arc<dyn Store>>) -> Result<impl IntoResponse, AppError> {
    let exams = store.list_exams().await?;
    Ok(Json(available_years(&exams)))
}

// src/handlers/feedback.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use validator::{Validate, ValidateEmail};

use crate::{
    error::AppError,
    models::feedback::{FeedbackNotification, FeedbackUpsert, SubmitFeedbackRequest},
    notify,
    state::AppState,
    store::Store,
    utils::{html::clean_comment, jwt::Claims},
};

/// Records the student's rating and comment for an exam.
///
/// One row per (student, exam): the first submission returns 201, later
/// ones overwrite it and return 200. The email notification is fired in the
/// background and never affects the response.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitFeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if !claims.email.validate_email() {
        return Err(AppError::BadRequest("A valid email is required.".to_string()));
    }
    let user_id = claims.user_id()?;

    let comment = clean_comment(&payload.comment);
    if comment.is_empty() {
        return Err(AppError::BadRequest("Comment cannot be empty.".to_string()));
    }

    let exam = state
        .store
        .get_exam(payload.exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let upserted = state
        .store
        .upsert_feedback(FeedbackUpsert {
            user_id,
            exam_id: exam.id,
            student_email: claims.email.clone(),
            rating: payload.rating,
            comment,
            at: chrono::Utc::now(),
        })
        .await?;

    let feedback = upserted.row;
    notify::dispatch(
        state.notifier.clone(),
        FeedbackNotification {
            course: exam.course,
            exam_type: exam.exam_type.to_string(),
            cycle: exam.cycle,
            period: exam.period.to_string(),
            year: exam.year,
            rating: feedback.rating,
            comment: feedback.comment.clone(),
            student_email: feedback.student_email.clone(),
            timestamp: feedback.updated_at,
        },
    );

    let status = if upserted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(feedback)))
}

/// Lists the current student's ratings.
pub async fn list_my_feedback(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let rows = store.list_feedback(claims.user_id()?).await?;
    Ok(Json(rows))
}

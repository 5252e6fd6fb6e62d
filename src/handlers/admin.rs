// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{ExamChanges, ExamType, NewExam, Period},
        user::CreateUserRequest,
    },
    state::AppState,
    store::Store,
    utils::{
        filename::{new_exam_key, replacement_key},
        hash::hash_password,
    },
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(store): State<Arc<dyn Store>>) -> Result<impl IntoResponse, AppError> {
    let users = store.list_users().await?;
    Ok(Json(users))
}

/// Creates an account with an explicit role.
/// Admin only.
pub async fn create_user(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;
    let user = store
        .create_user(&payload.email, &hashed_password, payload.role)
        .await?;

    tracing::info!("Created {} account {}", payload.role, user.email);

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": user.id}))))
}

const PDF_CONTENT_TYPE: &str = "application/pdf";

struct UploadedFile {
    content_type: Option<String>,
    bytes: Bytes,
}

/// Multipart exam form. Blank text fields count as absent.
#[derive(Default)]
struct ExamForm {
    course: Option<String>,
    exam_type: Option<String>,
    cycle: Option<String>,
    year: Option<String>,
    period: Option<String>,
    file: Option<UploadedFile>,
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ExamForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ExamForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // browsers send an empty part when no file was picked
                    if !bytes.is_empty() {
                        form.file = Some(UploadedFile { content_type, bytes });
                    }
                }
                "course" => form.course = non_blank(field.text().await?),
                "exam_type" => form.exam_type = non_blank(field.text().await?),
                "cycle" => form.cycle = non_blank(field.text().await?),
                "year" => form.year = non_blank(field.text().await?),
                "period" => form.period = non_blank(field.text().await?),
                other => tracing::debug!("Ignoring unknown form field '{}'", other),
            }
        }

        if let Some(file) = &form.file {
            if file.content_type.as_deref() != Some(PDF_CONTENT_TYPE) {
                return Err(AppError::BadRequest("Only PDF files are accepted.".to_string()));
            }
        }

        Ok(form)
    }

    fn exam_type(&self) -> Result<Option<ExamType>, AppError> {
        self.exam_type
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(AppError::BadRequest)
    }

    fn period(&self) -> Result<Option<Period>, AppError> {
        self.period
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(AppError::BadRequest)
    }

    fn year(&self) -> Result<Option<i32>, AppError> {
        self.year
            .as_deref()
            .map(str::parse::<i32>)
            .transpose()
            .map_err(|_| AppError::BadRequest("Year must be a number.".to_string()))
    }
}

/// Creates an exam from a multipart form and its PDF.
/// Admin only.
///
/// The PDF is stored first; if the row insert then fails the object is left
/// behind and only logged.
pub async fn create_exam(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = ExamForm::read(multipart).await?;

    let (Some(course), Some(exam_type), Some(cycle), Some(year), Some(period), Some(_)) = (
        form.course.clone(),
        form.exam_type()?,
        form.cycle.clone(),
        form.year()?,
        form.period()?,
        form.file.as_ref(),
    ) else {
        return Err(AppError::BadRequest("All fields are required.".to_string()));
    };

    let key = new_exam_key(
        &course,
        exam_type.as_str(),
        &cycle,
        year,
        period.as_str(),
        chrono::Utc::now().timestamp_millis(),
    );
    let bytes = form.file.map(|f| f.bytes).unwrap_or_default();

    let file_path = state
        .objects
        .upload(&key, bytes, true)
        .await
        .map_err(|e| AppError::Storage(format!("Upload of {} failed: {}", key, e)))?;
    let file_url = state.objects.public_url(&file_path);

    let exam = state
        .store
        .insert_exam(NewExam {
            course,
            exam_type,
            cycle,
            year,
            period,
            file_path: file_path.clone(),
            file_url,
        })
        .await
        .inspect_err(|_| tracing::warn!("Exam insert failed; object {} is orphaned", file_path))?;

    tracing::info!("Exam {} created ({})", exam.id, exam.file_path);

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Updates an exam; any omitted field is left unchanged.
/// Admin only.
///
/// With a new PDF attached the old object is removed (best-effort), the new
/// one is uploaded, and only then is the row pointed at it.
pub async fn update_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = ExamForm::read(multipart).await?;

    let mut changes = ExamChanges {
        course: form.course.clone(),
        exam_type: form.exam_type()?,
        cycle: form.cycle.clone(),
        year: form.year()?,
        period: form.period()?,
        file: None,
    };

    let existing = state
        .store
        .get_exam(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    if let Some(file) = form.file {
        if let Err(e) = state.objects.remove(&existing.file_path).await {
            tracing::warn!("Could not remove previous object {}: {}", existing.file_path, e);
        }

        let key = replacement_key(id, chrono::Utc::now().timestamp_millis());
        let file_path = state
            .objects
            .upload(&key, file.bytes, true)
            .await
            .map_err(|e| AppError::Storage(format!("Upload of {} failed: {}", key, e)))?;
        let file_url = state.objects.public_url(&file_path);
        changes.file = Some((file_path, file_url));
    }

    let uploaded = changes.file.as_ref().map(|(path, _)| path.clone());
    let orphan_warning = || {
        if let Some(path) = &uploaded {
            tracing::warn!("Exam {} update failed; object {} is orphaned", id, path);
        }
    };

    let exam = match state.store.update_exam(id, changes).await {
        Ok(Some(exam)) => exam,
        Ok(None) => {
            orphan_warning();
            return Err(AppError::NotFound("Exam not found".to_string()));
        }
        Err(e) => {
            orphan_warning();
            return Err(e);
        }
    };

    Ok(Json(exam))
}

/// Deletes an exam and then its stored PDF.
/// Admin only.
pub async fn delete_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = state
        .store
        .delete_exam(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    if let Err(e) = state.objects.remove(&exam.file_path).await {
        tracing::warn!("Could not remove object {} of deleted exam {}: {}", exam.file_path, id, e);
    }

    Ok(StatusCode::NO_CONTENT)
}

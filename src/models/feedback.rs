// src/models/feedback.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'feedback' table. One row per (user, exam).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub student_email: String,

    /// 1 to 5 stars.
    pub rating: i16,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input to the store's feedback upsert.
#[derive(Debug, Clone)]
pub struct FeedbackUpsert {
    pub user_id: i64,
    pub exam_id: i64,
    pub student_email: String,
    pub rating: i16,
    pub comment: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting a rating.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFeedbackRequest {
    pub exam_id: i64,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: i16,
    #[validate(
        length(max = 2000, message = "Comment must be at most 2000 characters."),
        custom(function = validate_comment)
    )]
    pub comment: String,
}

fn validate_comment(comment: &str) -> Result<(), validator::ValidationError> {
    if comment.trim().is_empty() {
        let mut err = validator::ValidationError::new("comment_cannot_be_empty");
        err.message = Some("Comment cannot be empty.".into());
        return Err(err);
    }
    Ok(())
}

/// Fields of the outbound feedback email.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackNotification {
    pub course: String,
    pub exam_type: String,
    pub cycle: String,
    pub period: String,
    pub year: i32,
    pub rating: i16,
    pub comment: String,
    pub student_email: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

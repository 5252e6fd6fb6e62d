// src/store/mod.rs

//! Row storage behind the service.
//!
//! Handlers only see the [`Store`] trait. `PgStore` backs production and
//! `MemoryStore` backs local runs without a database and the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamChanges, NewExam},
        feedback::{Feedback, FeedbackUpsert},
        history::DownloadRecord,
        user::{Role, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of an insert-or-update keyed by a unique constraint.
#[derive(Debug, Clone)]
pub struct Upserted<T> {
    pub row: T,
    /// `true` when a new row was inserted, `false` when an existing one was updated.
    pub created: bool,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<User, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// All exams ordered by id.
    async fn list_exams(&self) -> Result<Vec<Exam>, AppError>;

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, AppError>;

    async fn insert_exam(&self, exam: NewExam) -> Result<Exam, AppError>;

    /// Returns `None` when no exam has this id.
    async fn update_exam(&self, id: i64, changes: ExamChanges) -> Result<Option<Exam>, AppError>;

    /// Deletes the exam together with its feedback and download rows.
    /// Returns the deleted row so its stored object can be removed.
    async fn delete_exam(&self, id: i64) -> Result<Option<Exam>, AppError>;

    /// Single atomic write keyed by (user, exam).
    async fn upsert_feedback(&self, input: FeedbackUpsert) -> Result<Upserted<Feedback>, AppError>;

    async fn list_feedback(&self, user_id: i64) -> Result<Vec<Feedback>, AppError>;

    /// Atomically increments the (user, exam) counter, creating it at 1.
    async fn record_download(
        &self,
        user_id: i64,
        exam_id: i64,
        student_email: &str,
        at: DateTime<Utc>,
    ) -> Result<DownloadRecord, AppError>;

    async fn list_downloads(&self, user_id: i64) -> Result<Vec<DownloadRecord>, AppError>;
}

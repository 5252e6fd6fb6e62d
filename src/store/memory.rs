// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Store, Upserted};
use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamChanges, NewExam},
        feedback::{Feedback, FeedbackUpsert},
        history::DownloadRecord,
        user::{Role, User},
    },
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    exams: BTreeMap<i64, Exam>,
    feedback: Vec<Feedback>,
    downloads: Vec<DownloadRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store. Every write runs under one write lock, which gives the
/// upserts the same atomicity as the Postgres `ON CONFLICT` statements.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Inserts a user whose stored role bypasses `Role`, as a hand-edited row would.
    pub(crate) async fn insert_user_with_role(&self, email: &str, password_hash: &str, role: &str) -> User {
        let mut tables = self.tables.write().await;
        let user = User {
            id: tables.next_id(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role: role.to_string(),
            created_at: Some(Utc::now()),
        };
        tables.users.push(user.clone());
        user
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict(format!("Email '{}' already exists", email)));
        }
        let user = User {
            id: tables.next_id(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role: role.as_str().to_string(),
            created_at: Some(Utc::now()),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        let mut users = tables.users.clone();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(users)
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, AppError> {
        Ok(self.tables.read().await.exams.values().cloned().collect())
    }

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, AppError> {
        Ok(self.tables.read().await.exams.get(&id).cloned())
    }

    async fn insert_exam(&self, exam: NewExam) -> Result<Exam, AppError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let row = Exam {
            id,
            course: exam.course,
            exam_type: exam.exam_type,
            cycle: exam.cycle,
            year: exam.year,
            period: exam.period,
            file_path: exam.file_path,
            file_url: exam.file_url,
            created_at: Some(Utc::now()),
        };
        tables.exams.insert(id, row.clone());
        Ok(row)
    }

    async fn update_exam(&self, id: i64, changes: ExamChanges) -> Result<Option<Exam>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.exams.get_mut(&id).map(|exam| {
            changes.apply_to(exam);
            exam.clone()
        }))
    }

    async fn delete_exam(&self, id: i64) -> Result<Option<Exam>, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables.exams.remove(&id);
        if removed.is_some() {
            tables.feedback.retain(|f| f.exam_id != id);
            tables.downloads.retain(|d| d.exam_id != id);
        }
        Ok(removed)
    }

    async fn upsert_feedback(&self, input: FeedbackUpsert) -> Result<Upserted<Feedback>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.exams.contains_key(&input.exam_id) {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }

        if let Some(existing) = tables
            .feedback
            .iter_mut()
            .find(|f| f.user_id == input.user_id && f.exam_id == input.exam_id)
        {
            existing.student_email = input.student_email;
            existing.rating = input.rating;
            existing.comment = input.comment;
            existing.updated_at = input.at;
            return Ok(Upserted {
                row: existing.clone(),
                created: false,
            });
        }

        let row = Feedback {
            id: tables.next_id(),
            user_id: input.user_id,
            exam_id: input.exam_id,
            student_email: input.student_email,
            rating: input.rating,
            comment: input.comment,
            created_at: input.at,
            updated_at: input.at,
        };
        tables.feedback.push(row.clone());
        Ok(Upserted { row, created: true })
    }

    async fn list_feedback(&self, user_id: i64) -> Result<Vec<Feedback>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .feedback
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn record_download(
        &self,
        user_id: i64,
        exam_id: i64,
        student_email: &str,
        at: DateTime<Utc>,
    ) -> Result<DownloadRecord, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.exams.contains_key(&exam_id) {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }

        if let Some(existing) = tables
            .downloads
            .iter_mut()
            .find(|d| d.user_id == user_id && d.exam_id == exam_id)
        {
            existing.download_count += 1;
            existing.last_downloaded_at = at;
            return Ok(existing.clone());
        }

        let row = DownloadRecord {
            id: tables.next_id(),
            user_id,
            exam_id,
            student_email: student_email.to_string(),
            download_count: 1,
            last_downloaded_at: at,
        };
        tables.downloads.push(row.clone());
        Ok(row)
    }

    async fn list_downloads(&self, user_id: i64) -> Result<Vec<DownloadRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .downloads
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }
}

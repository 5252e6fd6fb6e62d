// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

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

const EXAM_COLUMNS: &str = "id, course, exam_type, cycle, year, period, file_path, file_url, created_at";

/// Raw 'exams' row. The enum columns are TEXT and parsed on the way out.
#[derive(Debug, FromRow)]
struct ExamRow {
    id: i64,
    course: String,
    exam_type: String,
    cycle: String,
    year: i32,
    period: String,
    file_path: String,
    file_url: String,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExamRow> for Exam {
    type Error = AppError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        Ok(Exam {
            id: row.id,
            course: row.course,
            exam_type: row.exam_type.parse().map_err(AppError::InternalServerError)?,
            cycle: row.cycle,
            year: row.year,
            period: row.period.parse().map_err(AppError::InternalServerError)?,
            file_path: row.file_path,
            file_url: row.file_url,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct FeedbackUpsertRow {
    #[sqlx(flatten)]
    feedback: Feedback,
    inserted: bool,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user: {:?}", e);
            AppError::from(e)
        })?;

        Ok(user)
    }

    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password, role, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Email '{}' already exists", email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password, role, created_at FROM users ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, AppError> {
        let rows = sqlx::query_as::<_, ExamRow>(&format!("SELECT {EXAM_COLUMNS} FROM exams ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list exams: {:?}", e);
                AppError::from(e)
            })?;

        rows.into_iter().map(Exam::try_from).collect()
    }

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, AppError> {
        sqlx::query_as::<_, ExamRow>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Exam::try_from)
            .transpose()
    }

    async fn insert_exam(&self, exam: NewExam) -> Result<Exam, AppError> {
        let row = sqlx::query_as::<_, ExamRow>(&format!(
            r#"
            INSERT INTO exams (course, exam_type, cycle, year, period, file_path, file_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EXAM_COLUMNS}
            "#
        ))
        .bind(exam.course)
        .bind(exam.exam_type.as_str())
        .bind(exam.cycle)
        .bind(exam.year)
        .bind(exam.period.as_str())
        .bind(exam.file_path)
        .bind(exam.file_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert exam: {:?}", e);
            AppError::from(e)
        })?;

        Exam::try_from(row)
    }

    async fn update_exam(&self, id: i64, changes: ExamChanges) -> Result<Option<Exam>, AppError> {
        if changes.is_empty() {
            return self.get_exam(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET ");
        let mut separated = builder.separated(", ");

        if let Some(course) = changes.course {
            separated.push("course = ");
            separated.push_bind_unseparated(course);
        }

        if let Some(exam_type) = changes.exam_type {
            separated.push("exam_type = ");
            separated.push_bind_unseparated(exam_type.as_str());
        }

        if let Some(cycle) = changes.cycle {
            separated.push("cycle = ");
            separated.push_bind_unseparated(cycle);
        }

        if let Some(year) = changes.year {
            separated.push("year = ");
            separated.push_bind_unseparated(year);
        }

        if let Some(period) = changes.period {
            separated.push("period = ");
            separated.push_bind_unseparated(period.as_str());
        }

        if let Some((file_path, file_url)) = changes.file {
            separated.push("file_path = ");
            separated.push_bind_unseparated(file_path);
            separated.push("file_url = ");
            separated.push_bind_unseparated(file_url);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {EXAM_COLUMNS}"));

        builder
            .build_query_as::<ExamRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update exam: {:?}", e);
                AppError::from(e)
            })?
            .map(Exam::try_from)
            .transpose()
    }

    async fn delete_exam(&self, id: i64) -> Result<Option<Exam>, AppError> {
        // feedback and download_history rows go with it (ON DELETE CASCADE)
        sqlx::query_as::<_, ExamRow>(&format!("DELETE FROM exams WHERE id = $1 RETURNING {EXAM_COLUMNS}"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete exam: {:?}", e);
                AppError::from(e)
            })?
            .map(Exam::try_from)
            .transpose()
    }

    async fn upsert_feedback(&self, input: FeedbackUpsert) -> Result<Upserted<Feedback>, AppError> {
        // xmax is 0 only for a freshly inserted tuple
        let row = sqlx::query_as::<_, FeedbackUpsertRow>(
            r#"
            INSERT INTO feedback (user_id, exam_id, student_email, rating, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (user_id, exam_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                student_email = EXCLUDED.student_email,
                updated_at = EXCLUDED.updated_at
            RETURNING id, user_id, exam_id, student_email, rating, comment,
                      created_at, updated_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(input.user_id)
        .bind(input.exam_id)
        .bind(&input.student_email)
        .bind(input.rating)
        .bind(&input.comment)
        .bind(input.at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("Exam not found".to_string())
            } else {
                tracing::error!("Failed to upsert feedback: {:?}", e);
                AppError::from(e)
            }
        })?;

        Ok(Upserted {
            row: row.feedback,
            created: row.inserted,
        })
    }

    async fn list_feedback(&self, user_id: i64) -> Result<Vec<Feedback>, AppError> {
        let rows = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, user_id, exam_id, student_email, rating, comment, created_at, updated_at
            FROM feedback
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn record_download(
        &self,
        user_id: i64,
        exam_id: i64,
        student_email: &str,
        at: DateTime<Utc>,
    ) -> Result<DownloadRecord, AppError> {
        sqlx::query_as::<_, DownloadRecord>(
            r#"
            INSERT INTO download_history (user_id, exam_id, student_email, download_count, last_downloaded_at)
            VALUES ($1, $2, $3, 1, $4)
            ON CONFLICT (user_id, exam_id) DO UPDATE
            SET download_count = download_history.download_count + 1,
                last_downloaded_at = EXCLUDED.last_downloaded_at
            RETURNING id, user_id, exam_id, student_email, download_count, last_downloaded_at
            "#,
        )
        .bind(user_id)
        .bind(exam_id)
        .bind(student_email)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("Exam not found".to_string())
            } else {
                tracing::error!("Failed to record download: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn list_downloads(&self, user_id: i64) -> Result<Vec<DownloadRecord>, AppError> {
        let rows = sqlx::query_as::<_, DownloadRecord>(
            r#"
            SELECT id, user_id, exam_id, student_email, download_count, last_downloaded_at
            FROM download_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

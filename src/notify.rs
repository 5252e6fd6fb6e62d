// src/notify.rs

//! Outbound feedback notifications.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::{config::EmailConfig, error::AppError, models::feedback::FeedbackNotification};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn feedback_received(&self, notification: &FeedbackNotification) -> Result<(), AppError>;
}

/// Sends a templated email through an EmailJS-compatible REST endpoint.
pub struct EmailJsNotifier {
    client: reqwest::Client,
    config: EmailConfig,
}

impl EmailJsNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for EmailJsNotifier {
    async fn feedback_received(&self, n: &FeedbackNotification) -> Result<(), AppError> {
        let body = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": {
                "curso": n.course,
                "tipo": n.exam_type,
                "ciclo": n.cycle,
                "periodo": n.period,
                "anio": n.year,
                "rating": n.rating,
                "comentario": n.comment,
                "email": n.student_email,
                "fecha": n.timestamp.to_rfc3339(),
            }
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::InternalServerError(format!("Email relay unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::InternalServerError(format!(
                "Email relay answered {status}: {text}"
            )));
        }
        Ok(())
    }
}

/// Used when no email relay is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn feedback_received(&self, n: &FeedbackNotification) -> Result<(), AppError> {
        tracing::info!(
            "Feedback from {} on {} {} {} {} {}: {} stars",
            n.student_email,
            n.course,
            n.exam_type,
            n.cycle,
            n.period,
            n.year,
            n.rating
        );
        Ok(())
    }
}

/// Fires the notification on a detached task. Failures are logged, never retried.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: FeedbackNotification) {
    tokio::spawn(async move {
        if let Err(e) = notifier.feedback_received(&notification).await {
            tracing::warn!(
                "Feedback notification for {} failed: {}",
                notification.student_email,
                e
            );
        }
    });
}

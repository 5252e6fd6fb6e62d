// tests/common/mod.rs

#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex, time::Duration};

use async_trait::async_trait;
use examurp::{
    cache::HistoryCache,
    config::Config,
    error::AppError,
    models::{feedback::FeedbackNotification, user::Role},
    notify::Notifier,
    routes,
    state::AppState,
    storage::LocalObjectStore,
    store::{MemoryStore, Store},
    utils::hash::hash_password,
};
use reqwest::multipart::{Form, Part};

pub const PASSWORD: &str = "clave123";

/// Captures notifications instead of sending email.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<FeedbackNotification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn feedback_received(&self, notification: &FeedbackNotification) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub storage_dir: PathBuf,
}

/// Spawns the app on a random port, backed by the in-memory store and a
/// throwaway storage directory.
pub async fn spawn_app() -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let storage_dir = std::env::temp_dir().join(format!("examurp-test-{}", uuid::Uuid::new_v4()));

    let config = Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
        bind_addr: listener.local_addr().unwrap(),
        storage_dir: storage_dir.clone(),
        storage_bucket: "examenes".to_string(),
        public_base_url: address.clone(),
        max_upload_bytes: 5 * 1024 * 1024,
        history_cache_ttl_secs: 30,
        allowed_origins: vec!["http://localhost:5173".to_string()],
        email: None,
    };

    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState {
        store: store.clone(),
        objects: Arc::new(LocalObjectStore::new(
            config.bucket_dir(),
            &config.public_base_url,
            &config.storage_bucket,
        )),
        notifier: notifier.clone(),
        history_cache: HistoryCache::new(Duration::from_secs(config.history_cache_ttl_secs)),
        config,
    };

    let app = routes::create_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        store,
        notifier,
        storage_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Creates an account directly in the store and returns its bearer token.
    pub async fn user_token(&self, role: Role) -> String {
        let email = format!("{}_{}@urp.edu.pe", role, &uuid::Uuid::new_v4().to_string()[..8]);
        let hash = hash_password(PASSWORD).unwrap();
        self.store.create_user(&email, &hash, role).await.unwrap();
        self.login(&email, PASSWORD).await["token"]
            .as_str()
            .expect("Token not found")
            .to_string()
    }

    pub async fn login(&self, email: &str, password: &str) -> serde_json::Value {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json")
    }

    /// Posts a complete exam form with a small PDF and returns the created exam.
    pub async fn create_exam(
        &self,
        token: &str,
        course: &str,
        exam_type: &str,
        cycle: &str,
        year: i32,
        period: &str,
    ) -> serde_json::Value {
        let form = Form::new()
            .text("course", course.to_string())
            .text("exam_type", exam_type.to_string())
            .text("cycle", cycle.to_string())
            .text("year", year.to_string())
            .text("period", period.to_string())
            .part("file", pdf_part(b"%PDF-1.4 original"));

        let response = self
            .client
            .post(self.url("/api/admin/exams"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Create exam failed");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

pub fn pdf_part(bytes: &'static [u8]) -> Part {
    Part::bytes(bytes)
        .file_name("exam.pdf")
        .mime_str("application/pdf")
        .unwrap()
}

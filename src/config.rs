// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf};

use dotenvy::dotenv;
use url::Url;

/// Credentials for the REST email relay used by the feedback notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub bind_addr: SocketAddr,
    pub storage_dir: PathBuf,
    pub storage_bucket: String,
    /// Base URL prepended to `/storage/{bucket}/...` when building public file links.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub history_cache_ttl_secs: u64,
    pub allowed_origins: Vec<String>,
    pub email: Option<EmailConfig>,
}

const DEFAULT_EMAIL_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = parse_or("JWT_EXPIRATION", 86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .expect("BIND_ADDR must be a socket address");

        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        Url::parse(&public_base_url).expect("PUBLIC_BASE_URL must be an absolute URL");

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let email = match (
            env::var("EMAILJS_SERVICE_ID"),
            env::var("EMAILJS_TEMPLATE_ID"),
            env::var("EMAILJS_PUBLIC_KEY"),
        ) {
            (Ok(service_id), Ok(template_id), Ok(public_key)) => Some(EmailConfig {
                endpoint: env::var("EMAILJS_ENDPOINT")
                    .unwrap_or_else(|_| DEFAULT_EMAIL_ENDPOINT.to_string()),
                service_id,
                template_id,
                public_key,
            }),
            _ => None,
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            bind_addr,
            storage_dir: PathBuf::from(
                env::var("STORAGE_DIR").unwrap_or_else(|_| "storage".to_string()),
            ),
            storage_bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "examenes".to_string()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            history_cache_ttl_secs: parse_or("HISTORY_CACHE_TTL_SECS", 30),
            allowed_origins,
            email,
        }
    }

    /// Directory the object store writes to and `/storage/{bucket}` serves from.
    pub fn bucket_dir(&self) -> PathBuf {
        self.storage_dir.join(&self.storage_bucket)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} has an invalid value: {raw}")),
        Err(_) => default,
    }
}

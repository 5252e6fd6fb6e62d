// src/storage.rs

//! Binary object storage for exam PDFs.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;

use crate::error::AppError;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `path`. With `upsert` an existing object is
    /// overwritten, otherwise it is a `Conflict`. Returns the stored path.
    async fn upload(&self, path: &str, bytes: Bytes, upsert: bool) -> Result<String, AppError>;

    async fn remove(&self, path: &str) -> Result<(), AppError>;

    fn public_url(&self, path: &str) -> String;
}

/// Filesystem bucket served by `tower_http::services::ServeDir` under
/// `/storage/{bucket}`.
pub struct LocalObjectStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str, bucket: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: format!("{}/storage/{}", public_base_url.trim_end_matches('/'), bucket),
        }
    }

    /// Resolves a key inside the bucket, refusing anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(AppError::BadRequest(format!("Invalid object path '{}'", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, path: &str, bytes: Bytes, upsert: bool) -> Result<String, AppError> {
        let target = self.resolve(path)?;

        if !upsert && tokio::fs::try_exists(&target).await? {
            return Err(AppError::Conflict(format!("Object '{}' already exists", path)));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes.as_ref()).await?;

        tracing::info!("Stored object {} ({} bytes)", path, bytes.len());
        Ok(path.to_string())
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Object '{}' not found", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (LocalObjectStore, PathBuf) {
        let root = std::env::temp_dir().join(format!(
            "examurp-objects-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        (LocalObjectStore::new(&root, "http://localhost:3000/", "examenes"), root)
    }

    #[tokio::test]
    async fn upload_respects_the_upsert_flag() {
        let (store, root) = store();

        store.upload("pdfs/a.pdf", Bytes::from_static(b"one"), false).await.unwrap();
        let err = store
            .upload("pdfs/a.pdf", Bytes::from_static(b"two"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        store.upload("pdfs/a.pdf", Bytes::from_static(b"two"), true).await.unwrap();
        assert_eq!(std::fs::read(root.join("pdfs/a.pdf")).unwrap(), b"two");

        store.remove("pdfs/a.pdf").await.unwrap();
        assert!(matches!(store.remove("pdfs/a.pdf").await, Err(AppError::NotFound(_))));
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn paths_cannot_escape_the_bucket() {
        let (store, _root) = store();
        for bad in ["../secret", "/etc/passwd", "", "pdfs/../../x"] {
            let res = store.upload(bad, Bytes::from_static(b"x"), true).await;
            assert!(matches!(res, Err(AppError::BadRequest(_))), "{bad}");
        }
    }

    #[test]
    fn public_url_is_prefixed_with_bucket() {
        let (store, _root) = store();
        assert_eq!(
            store.public_url("pdfs/a.pdf"),
            "http://localhost:3000/storage/examenes/pdfs/a.pdf"
        );
    }
}

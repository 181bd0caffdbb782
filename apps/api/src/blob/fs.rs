//! Local-filesystem blob backend.
//!
//! Files land in one flat uploads directory and are addressed as
//! `/uploads/{key}`, the same path the router serves statically when this
//! backend is active.

use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;
use tracing::info;

use crate::errors::AppError;

use super::{object_key, BlobStore};

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates the uploads directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::Blob(format!("create {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    /// Directory the router mounts at `/uploads`.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, file_name: &str, bytes: Bytes) -> Result<String, AppError> {
        let key = object_key(file_name);
        let path = self.root.join(&key);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Blob(format!("write {}: {e}", path.display())))?;
        info!(key, size = bytes.len(), "stored upload");
        Ok(format!("/uploads/{key}"))
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let Some(key) = url.strip_prefix("/uploads/") else {
            return Ok(());
        };
        // Keys are flat; anything path-like did not come from this store.
        if key.contains('/') || key.contains("..") {
            return Ok(());
        }
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Blob(format!("delete {key}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).await.unwrap();

        let url = store
            .put("resume.pdf", Bytes::from_static(b"%PDF-1.4 test"))
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("-resume.pdf"));

        let key = url.strip_prefix("/uploads/").unwrap();
        let on_disk = dir.path().join(key);
        assert!(on_disk.exists());

        store.delete(&url).await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_delete_of_unknown_url_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).await.unwrap();

        store.delete("/uploads/never-stored.pdf").await.unwrap();
        store.delete("https://elsewhere/obj").await.unwrap();
        store.delete("/uploads/../outside").await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_in_file_name_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).await.unwrap();

        let url = store
            .put("../../escape.pdf", Bytes::from_static(b"x"))
            .await
            .unwrap();
        let key = url.strip_prefix("/uploads/").unwrap();
        assert!(!key.contains('/'));
        assert!(dir.path().join(key).exists());
    }
}

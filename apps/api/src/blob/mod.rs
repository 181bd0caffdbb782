//! Opaque blob storage for uploaded resume PDFs.
//!
//! Records carry only the URL `put` returns; everything else about the
//! backend is hidden behind the trait. `FsBlobStore` keeps files in a
//! local uploads directory served statically; `S3BlobStore` targets an
//! S3-compatible endpoint.

pub mod fs;
#[cfg(test)]
pub mod mem;
pub mod s3;

pub use fs::FsBlobStore;
pub use s3::S3BlobStore;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the bytes under a fresh object key derived from `file_name`
    /// and returns the URL the resume record will carry.
    async fn put(&self, file_name: &str, bytes: Bytes) -> Result<String, AppError>;

    /// Deletes the object a previous `put` returned. URLs this store never
    /// issued, and objects already gone, are quietly ignored; rollback of
    /// a rejected submission must not fail on a missing file.
    async fn delete(&self, url: &str) -> Result<(), AppError>;
}

/// Object key: upload millis, a random component, then the original file
/// name with anything path-like flattened out.
pub(crate) fn object_key(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitized
    )
}

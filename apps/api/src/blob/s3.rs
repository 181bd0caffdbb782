//! S3-compatible blob backend (AWS or MinIO).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use axum::body::Bytes;
use tracing::info;

use crate::errors::AppError;

use super::{object_key, BlobStore};

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    /// Endpoint the stored URLs point at, e.g. `http://localhost:9000`.
    public_endpoint: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: String, public_endpoint: String) -> Self {
        Self {
            client,
            bucket,
            public_endpoint: public_endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket, key)
    }

    fn key_from(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/{}/", self.public_endpoint, self.bucket))
            .map(str::to_string)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, file_name: &str, bytes: Bytes) -> Result<String, AppError> {
        let key = format!("resumes/{}", object_key(file_name));
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| AppError::Blob(format!("S3 upload failed: {e}")))?;
        info!("uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(self.url_for(&key))
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let Some(key) = self.key_from(url) else {
            return Ok(());
        };
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| AppError::Blob(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}

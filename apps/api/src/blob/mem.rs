//! In-memory blob double for pipeline tests: counts objects so rollback
//! assertions can check that a rejected submission leaves nothing behind.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use parking_lot::Mutex;

use crate::errors::AppError;

use super::{object_key, BlobStore};

#[derive(Default)]
pub struct MemBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemBlobStore {
    pub fn new() -> Self {
        MemBlobStore::default()
    }

    pub fn count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().contains_key(url)
    }
}

#[async_trait]
impl BlobStore for MemBlobStore {
    async fn put(&self, file_name: &str, bytes: Bytes) -> Result<String, AppError> {
        let url = format!("/uploads/{}", object_key(file_name));
        self.objects.lock().insert(url.clone(), bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        self.objects.lock().remove(url);
        Ok(())
    }
}

//! Best-effort plain text extraction from an uploaded PDF.
//!
//! Layout is irrelevant: the only consumer is the phone-number scan in
//! [`phone`], which works on the flat character stream. This is not OCR;
//! a scanned-image PDF simply yields no text and therefore no phone.

pub mod phone;

use anyhow::anyhow;
use bytes::Bytes;
use tracing::warn;

use crate::errors::AppError;

/// Cheap magic-byte check backing the PDF-only upload rule.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Decodes a PDF byte stream to flat text.
///
/// Decoding is CPU-bound, so it runs via `spawn_blocking`; a slow or hung
/// document stalls only its own request, never the executor. A failed
/// decode is fatal for the submission; the caller must roll back the
/// stored blob.
pub async fn text_from_pdf(bytes: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow!("spawn_blocking failed during PDF extraction: {e}"))
        })?
        .map_err(|e| {
            warn!("PDF parsing error: {e}");
            AppError::ExtractionFailed(e.to_string())
        })
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ResumeStatus;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Taxonomy: validation (caller fixes and retries), not-found (caller must
/// re-resolve), conflict (caller must not blindly retry the same request),
/// and internal. Best-effort failures (notification persistence, email
/// dispatch) never become an `AppError`; they are logged where they occur.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Resume {0} not found")]
    ResumeNotFound(Uuid),

    #[error("Agency not found for the provided email or name: {0}")]
    AgencyNotFound(String),

    #[error("Only PDF files are allowed")]
    InvalidFileType,

    #[error("No phone number found in the uploaded PDF")]
    PhoneNotFound,

    #[error("Failed to parse PDF: {0}")]
    ExtractionFailed(String),

    #[error("Duplicate resume: this phone number has already been submitted for this job")]
    DuplicateSubmission,

    #[error("Cannot move resume from {from} to {to}")]
    IllegalTransition {
        from: ResumeStatus,
        to: ResumeStatus,
    },

    #[error("This job has expired; agencies can no longer move its resumes")]
    JobExpired,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Blob storage error: {0}")]
    Blob(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::JobNotFound(_) => (StatusCode::NOT_FOUND, "JOB_NOT_FOUND", self.to_string()),
            AppError::ResumeNotFound(_) => {
                (StatusCode::NOT_FOUND, "RESUME_NOT_FOUND", self.to_string())
            }
            AppError::AgencyNotFound(_) => {
                (StatusCode::NOT_FOUND, "AGENCY_NOT_FOUND", self.to_string())
            }
            AppError::InvalidFileType => {
                (StatusCode::BAD_REQUEST, "INVALID_FILE_TYPE", self.to_string())
            }
            AppError::PhoneNotFound => {
                (StatusCode::BAD_REQUEST, "PHONE_NOT_FOUND", self.to_string())
            }
            AppError::ExtractionFailed(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_FAILED",
                self.to_string(),
            ),
            AppError::DuplicateSubmission => (
                StatusCode::CONFLICT,
                "DUPLICATE_SUBMISSION",
                self.to_string(),
            ),
            AppError::IllegalTransition { .. } => (
                StatusCode::CONFLICT,
                "ILLEGAL_TRANSITION",
                self.to_string(),
            ),
            AppError::JobExpired => (StatusCode::CONFLICT, "JOB_EXPIRED", self.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Blob(msg) => {
                tracing::error!("Blob storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "BLOB_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_class_maps_to_409() {
        for err in [
            AppError::DuplicateSubmission,
            AppError::JobExpired,
            AppError::IllegalTransition {
                from: ResumeStatus::Shortlisted,
                to: ResumeStatus::Pending,
            },
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_not_found_class_maps_to_404() {
        let id = Uuid::new_v4();
        for err in [
            AppError::JobNotFound(id),
            AppError::ResumeNotFound(id),
            AppError::AgencyNotFound("acme".to_string()),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_extraction_failure_maps_to_422() {
        let response = AppError::ExtractionFailed("bad xref".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

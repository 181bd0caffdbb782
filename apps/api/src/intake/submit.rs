//! The submission pipeline: resolve job and agency, validate the upload,
//! store the blob, determine the candidate phone, enforce the duplicate
//! rule, and write both resume views.

use axum::body::Bytes;
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::errors::AppError;
use crate::extract::{self, phone};
use crate::models::{Job, Resume, ResumeStatus, User};
use crate::store::PortalStore;

/// A decoded submission, ready for the pipeline. The HTTP layer fills this
/// from multipart form fields.
#[derive(Debug)]
pub struct SubmitRequest {
    pub job_id: Uuid,
    /// Agency email, or agency name as a fallback.
    pub agency_identifier: String,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    /// When present and non-blank, used verbatim; PDF extraction is skipped.
    pub candidate_phone: Option<String>,
    pub file_name: String,
    pub pdf_bytes: Bytes,
}

/// Runs a submission end to end and returns the stored canonical record.
///
/// The blob upload is the only side effect taken before the store write;
/// any failure past it deletes the blob again, so a rejected submission
/// leaves no stored file behind. Deadlines do not gate submissions: an
/// expired job still accepts resumes, it only blocks agency status moves.
pub async fn submit_resume(
    store: &dyn PortalStore,
    blobs: &dyn BlobStore,
    request: SubmitRequest,
) -> Result<Resume, AppError> {
    let job = store
        .get_job(request.job_id)
        .await?
        .ok_or(AppError::JobNotFound(request.job_id))?;

    let agency = store
        .resolve_agency(&request.agency_identifier)
        .await?
        .ok_or_else(|| AppError::AgencyNotFound(request.agency_identifier.clone()))?;

    if !extract::looks_like_pdf(&request.pdf_bytes) {
        return Err(AppError::InvalidFileType);
    }

    let file_url = blobs
        .put(&request.file_name, request.pdf_bytes.clone())
        .await?;

    match persist_submission(store, &job, &agency, &request, file_url.clone()).await {
        Ok(resume) => Ok(resume),
        Err(err) => {
            rollback_blob(blobs, &file_url).await;
            Err(err)
        }
    }
}

/// Everything after the blob upload, separated out so `submit_resume` has a
/// single rollback point.
async fn persist_submission(
    store: &dyn PortalStore,
    job: &Job,
    agency: &User,
    request: &SubmitRequest,
    file_url: String,
) -> Result<Resume, AppError> {
    let candidate_phone = match non_blank(request.candidate_phone.as_deref()) {
        Some(supplied) => supplied,
        None => {
            let text = extract::text_from_pdf(request.pdf_bytes.clone()).await?;
            phone::first_phone(&text)
                .map(str::to_string)
                .ok_or(AppError::PhoneNotFound)?
        }
    };

    // Early probe for the common case. insert_resume re-checks under the
    // job lock, so a concurrent submit cannot sneak a duplicate through.
    if store.phone_exists_for_job(job.id, &candidate_phone).await? {
        return Err(AppError::DuplicateSubmission);
    }

    let resume = Resume {
        id: Uuid::new_v4(),
        candidate_name: non_blank(request.candidate_name.as_deref()),
        candidate_email: non_blank(request.candidate_email.as_deref()),
        candidate_phone,
        file_url,
        job_id: job.id,
        status: ResumeStatus::Pending,
        uploaded_by_agency_id: agency.id,
        uploaded_by_agency_name: agency.name.clone(),
        uploaded_by_agency_email: agency.email.clone(),
        created_at: Utc::now(),
    };
    store.insert_resume(&resume).await?;

    info!(
        resume_id = %resume.id,
        job_id = %job.id,
        agency = %agency.name,
        "resume accepted"
    );
    Ok(resume)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn rollback_blob(blobs: &dyn BlobStore, url: &str) {
    if let Err(e) = blobs.delete(url).await {
        error!("failed to remove blob {url} after a rejected submission: {e}");
    }
}

//! Axum route handlers for the intake API: multipart resume submission,
//! status changes, and the two resume views.

use axum::body::Bytes;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::status::{change_status, StatusChangeRequest};
use crate::intake::submit::{submit_resume, SubmitRequest};
use crate::models::{EmbeddedResume, Resume, ResumeStatus, UserRole};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ResumeStatus,
    pub actor_role: UserRole,
    pub actor_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AgencyDirectoryEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// POST /api/jobs/:job_id/resumes
///
/// Multipart submission: a `file` part carrying the PDF, an `agency`
/// field (email or name), and optional `candidate_name`,
/// `candidate_email`, `candidate_phone` fields.
pub async fn handle_submit_resume(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let request = decode_submission(job_id, multipart).await?;
    let resume = submit_resume(state.store.as_ref(), state.blobs.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(resume)))
}

async fn decode_submission(
    job_id: Uuid,
    mut multipart: Multipart,
) -> Result<SubmitRequest, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut agency = None;
    let mut candidate_name = None;
    let mut candidate_email = None;
    let mut candidate_phone = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                // The declared mime is checked here; the magic bytes are
                // checked again inside the pipeline.
                if let Some(content_type) = field.content_type() {
                    if content_type != "application/pdf" {
                        return Err(AppError::InvalidFileType);
                    }
                }
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some((file_name, bytes));
            }
            "agency" => agency = Some(field.text().await.map_err(bad_multipart)?),
            "candidate_name" => candidate_name = Some(field.text().await.map_err(bad_multipart)?),
            "candidate_email" => candidate_email = Some(field.text().await.map_err(bad_multipart)?),
            "candidate_phone" => candidate_phone = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }

    let (file_name, pdf_bytes) =
        file.ok_or_else(|| AppError::Validation("Resume file is required".to_string()))?;
    let agency_identifier =
        agency.ok_or_else(|| AppError::Validation("Agency identifier is required".to_string()))?;

    Ok(SubmitRequest {
        job_id,
        agency_identifier,
        candidate_name,
        candidate_email,
        candidate_phone,
        file_name,
        pdf_bytes,
    })
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {e}"))
}

/// PATCH /api/resumes/:id/status
///
/// Moves one resume through the forward-only pipeline. Conflicts (illegal
/// transition, expired job for agency actors) come back as 409.
pub async fn handle_update_resume_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Resume>, AppError> {
    let resume = change_status(
        state.store.as_ref(),
        &state.mailer,
        StatusChangeRequest {
            resume_id: id,
            new_status: request.status,
            actor_role: request.actor_role,
            actor_id: request.actor_id,
        },
    )
    .await?;
    Ok(Json(resume))
}

/// GET /api/jobs/:job_id/resumes
///
/// The embedded view: snapshots straight off the job document.
pub async fn handle_job_resumes(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<EmbeddedResume>>, AppError> {
    let job = state
        .store
        .get_job(job_id)
        .await?
        .ok_or(AppError::JobNotFound(job_id))?;
    Ok(Json(job.resumes))
}

/// GET /api/agencies/:agency_id/resumes
///
/// The canonical view: full records submitted by one agency, newest first.
pub async fn handle_agency_resumes(
    State(state): State<AppState>,
    Path(agency_id): Path<Uuid>,
) -> Result<Json<Vec<Resume>>, AppError> {
    let resumes = state.store.resumes_for_agency(agency_id).await?;
    Ok(Json(resumes))
}

/// GET /api/agencies
///
/// Read-only agency directory used by submission forms.
pub async fn handle_list_agencies(
    State(state): State<AppState>,
) -> Result<Json<Vec<AgencyDirectoryEntry>>, AppError> {
    let agencies = state.store.list_agencies().await?;
    let directory = agencies
        .into_iter()
        .map(|agency| AgencyDirectoryEntry {
            id: agency.id,
            name: agency.name,
            email: agency.email,
        })
        .collect();
    Ok(Json(directory))
}

//! Axum route handlers for job postings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::lifecycle::{create_job, delete_job, CreateJobRequest};
use crate::models::Job;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteJobResponse {
    pub message: String,
}

/// POST /api/jobs
///
/// Creates a posting and fans the `NewJob` notification out to every
/// agency before responding.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = create_job(state.store.as_ref(), &state.mailer, request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = state.store.list_jobs().await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .store
        .get_job(job_id)
        .await?
        .ok_or(AppError::JobNotFound(job_id))?;
    Ok(Json(job))
}

/// DELETE /api/jobs/:job_id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<DeleteJobResponse>, AppError> {
    delete_job(state.store.as_ref(), job_id).await?;
    Ok(Json(DeleteJobResponse {
        message: "Job deleted successfully".to_string(),
    }))
}

//! Job lifecycle services: creation with agency fan-out, deletion with
//! notification expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Job, JobStatus};
use crate::notify::fanout;
use crate::notify::mailer::Mailer;
use crate::store::PortalStore;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
}

/// Creates a job and fans a `NewJob` notification out to every agency.
/// Fan-out failures are logged per recipient and never fail the creation.
pub async fn create_job(
    store: &dyn PortalStore,
    mailer: &Arc<dyn Mailer>,
    request: CreateJobRequest,
) -> Result<Job, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Job title is required".to_string()));
    }
    let description = request.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation(
            "Job description is required".to_string(),
        ));
    }

    let job = Job {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: description.to_string(),
        deadline: request.deadline,
        status: JobStatus::Open,
        resumes: vec![],
        created_at: Utc::now(),
    };
    store.insert_job(&job).await?;
    info!(job_id = %job.id, title = %job.title, "job created");

    fanout::job_created(store, mailer, &job).await;
    Ok(job)
}

/// Deletes a job and synchronously marks its `NewJob` notifications as
/// expired. Canonical resumes submitted against the job are kept; only
/// the embedded snapshots go down with the job document.
pub async fn delete_job(store: &dyn PortalStore, job_id: Uuid) -> Result<(), AppError> {
    if !store.delete_job(job_id).await? {
        return Err(AppError::JobNotFound(job_id));
    }
    let expired = store.expire_job_notifications(&[job_id]).await?;
    info!(job_id = %job_id, expired, "job deleted");
    Ok(())
}

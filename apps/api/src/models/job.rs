use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ResumeStatus;

/// Posting status. No operation in the intake workflow transitions it;
/// jobs are created `Open` and stay visible regardless of deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

/// Denormalized copy of a resume stored inline on the owning job for fast
/// listing (the kanban read path). The canonical record lives in the
/// `resumes` store; this snapshot must agree with it on `id`, `status`
/// and `file_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedResume {
    pub id: Uuid,
    pub file_url: String,
    pub candidate_phone: String,
    pub status: ResumeStatus,
    pub uploaded_by_agency_id: Uuid,
    pub uploaded_by_agency_name: String,
    pub uploaded_by_agency_email: String,
    pub uploaded_at: DateTime<Utc>,
}

/// An admin-posted job opening.
///
/// `deadline` is informational for listing purposes; it only gates agency
/// status-change actions (see `intake::status`). `resumes` holds embedded
/// snapshots in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub status: JobStatus,
    pub resumes: Vec<EmbeddedResume>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now
    }
}

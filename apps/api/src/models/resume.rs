use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review status of a submitted resume.
///
/// The pipeline is forward-only: `Pending` is the sole entry state and a
/// resume never returns to it once shortlisted or rejected. Legality of a
/// transition is decided by `intake::status::decide`, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "resume_status", rename_all = "lowercase")]
pub enum ResumeStatus {
    Pending,
    Shortlisted,
    Rejected,
}

impl ResumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeStatus::Pending => "pending",
            ResumeStatus::Shortlisted => "shortlisted",
            ResumeStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ResumeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical resume record, the source of truth for a submission.
///
/// Its identity is shared with the embedded snapshot inside the owning
/// `Job` (`EmbeddedResume` with the same `id`); the two must agree on
/// `id`, `status` and `file_url` after every successful operation.
///
/// The `uploaded_by_agency_*` fields are a snapshot of the submitting
/// agency taken at submission time; they are intentionally not re-synced
/// if the agency later renames, and the record outlives deletion of the
/// agency account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub candidate_phone: String,
    pub file_url: String,
    pub job_id: Uuid,
    pub status: ResumeStatus,
    pub uploaded_by_agency_id: Uuid,
    pub uploaded_by_agency_name: String,
    pub uploaded_by_agency_email: String,
    pub created_at: DateTime<Utc>,
}

impl Resume {
    /// Builds the embedded snapshot that mirrors this record inside the
    /// owning job document.
    pub fn snapshot(&self) -> super::EmbeddedResume {
        super::EmbeddedResume {
            id: self.id,
            file_url: self.file_url.clone(),
            candidate_phone: self.candidate_phone.clone(),
            status: self.status,
            uploaded_by_agency_id: self.uploaded_by_agency_id,
            uploaded_by_agency_name: self.uploaded_by_agency_name.clone(),
            uploaded_by_agency_email: self.uploaded_by_agency_email.clone(),
            uploaded_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_serde() {
        for status in [
            ResumeStatus::Pending,
            ResumeStatus::Shortlisted,
            ResumeStatus::Rejected,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            let back: ResumeStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_snapshot_agrees_on_identity_fields() {
        let resume = Resume {
            id: Uuid::new_v4(),
            candidate_name: Some("Asha Rao".to_string()),
            candidate_email: None,
            candidate_phone: "+91 9876543210".to_string(),
            file_url: "/uploads/123-abc-resume.pdf".to_string(),
            job_id: Uuid::new_v4(),
            status: ResumeStatus::Pending,
            uploaded_by_agency_id: Uuid::new_v4(),
            uploaded_by_agency_name: "Acme Staffing".to_string(),
            uploaded_by_agency_email: "acme@example.com".to_string(),
            created_at: Utc::now(),
        };
        let snap = resume.snapshot();
        assert_eq!(snap.id, resume.id);
        assert_eq!(snap.status, resume.status);
        assert_eq!(snap.file_url, resume.file_url);
        assert_eq!(snap.candidate_phone, resume.candidate_phone);
        assert_eq!(snap.uploaded_at, resume.created_at);
    }
}

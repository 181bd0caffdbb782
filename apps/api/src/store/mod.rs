//! Storage seam for the intake workflow.
//!
//! Every workflow service talks to a `PortalStore` trait object, never to a
//! concrete backend. `PgStore` is the production backend; `MemStore` backs
//! tests and the zero-infra dev mode. The store owns the dual-write
//! invariant: a canonical resume row and its embedded snapshot inside the
//! owning job are written in one logical operation, and duplicate phones are
//! rejected inside that same operation so no race can slip a second
//! submission between check and insert.

pub mod mem;
pub mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Job, Notification, Resume, ResumeStatus, User};

/// Outcome of a compare-and-set status write on a resume.
///
/// The caller supplies the status it last observed; the store applies the
/// update only if the canonical row still carries it. On `Stale` the caller
/// gets the fresh row back and re-runs its transition decision.
#[derive(Debug)]
pub enum StatusWrite {
    /// Canonical row updated. `embedded_updated` is false when the owning
    /// job or its snapshot could not be found, which the caller logs as a
    /// consistency fault without failing the operation.
    Applied {
        resume: Resume,
        embedded_updated: bool,
    },
    /// The canonical row no longer carries the expected status.
    Stale(Resume),
    /// No canonical row with that id.
    Missing,
}

/// A disagreement between the canonical resume table and the embedded
/// snapshots on a job, as reported by [`PortalStore::audit_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyFault {
    /// Canonical row exists, no snapshot with its id on the job.
    MissingEmbedded { resume_id: Uuid },
    /// Both views exist but disagree on status.
    StatusMismatch {
        resume_id: Uuid,
        canonical: ResumeStatus,
        embedded: ResumeStatus,
    },
    /// Both views exist but disagree on the blob reference.
    FileUrlMismatch { resume_id: Uuid },
    /// Snapshot exists on the job with no canonical row behind it.
    OrphanSnapshot { resume_id: Uuid },
}

#[async_trait]
pub trait PortalStore: Send + Sync {
    // ── jobs ─────────────────────────────────────────────────────────

    async fn insert_job(&self, job: &Job) -> Result<(), AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError>;

    /// All jobs, oldest first.
    async fn list_jobs(&self) -> Result<Vec<Job>, AppError>;

    /// Removes the job and its embedded snapshots. Canonical resumes are
    /// untouched. Returns whether a job existed.
    async fn delete_job(&self, id: Uuid) -> Result<bool, AppError>;

    // ── resumes (dual view) ──────────────────────────────────────────

    /// Inserts the canonical row and appends the embedded snapshot to the
    /// owning job in one logical operation.
    ///
    /// Re-checks the duplicate rule (same phone on the same job, in either
    /// view) under the job lock and fails with
    /// [`AppError::DuplicateSubmission`] on a collision. Fails with
    /// [`AppError::JobNotFound`] if the job vanished since the caller
    /// resolved it.
    async fn insert_resume(&self, resume: &Resume) -> Result<(), AppError>;

    async fn get_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError>;

    /// Compare-and-set on the canonical status, mirrored into the embedded
    /// snapshot in the same logical operation. See [`StatusWrite`].
    async fn update_resume_status(
        &self,
        id: Uuid,
        expected: ResumeStatus,
        new_status: ResumeStatus,
    ) -> Result<StatusWrite, AppError>;

    /// Canonical resumes submitted by one agency, newest first.
    async fn resumes_for_agency(&self, agency_id: Uuid) -> Result<Vec<Resume>, AppError>;

    /// Duplicate probe: true when the phone already appears on the job in
    /// either the canonical table or the embedded snapshots. The same phone
    /// on a different job never matches.
    async fn phone_exists_for_job(&self, job_id: Uuid, phone: &str) -> Result<bool, AppError>;

    // ── notifications ────────────────────────────────────────────────

    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError>;

    /// All notifications for one recipient, newest first.
    async fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError>;

    /// Flags every unread notification of the recipient as read. Returns
    /// how many were flipped.
    async fn mark_notifications_read(&self, user_id: Uuid) -> Result<u64, AppError>;

    /// Marks live `new_job` notifications for the given jobs as expired.
    /// Returns how many were flipped.
    async fn expire_job_notifications(&self, job_ids: &[Uuid]) -> Result<u64, AppError>;

    /// Distinct job ids referenced by live `new_job` notifications; the
    /// sweep's working set.
    async fn referenced_job_ids(&self) -> Result<Vec<Uuid>, AppError>;

    /// Deadlines of the given jobs. Deleted jobs are simply absent.
    async fn job_deadlines(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, DateTime<Utc>)>, AppError>;

    // ── users ────────────────────────────────────────────────────────

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Resolves an agency identifier the way submissions reference one:
    /// first as an exact email, then as a case-insensitive agency name.
    async fn resolve_agency(&self, identifier: &str) -> Result<Option<User>, AppError>;

    /// All agency-role users, by name. The fan-out recipient list.
    async fn list_agencies(&self) -> Result<Vec<User>, AppError>;

    /// Inserts the user unless one with the same email exists. Startup
    /// seeding hook.
    async fn ensure_user(&self, user: &User) -> Result<(), AppError>;

    // ── consistency audit ────────────────────────────────────────────

    /// Compares the canonical rows of a job against its embedded snapshots
    /// and reports every disagreement. An empty result means the dual-write
    /// invariant holds for that job.
    async fn audit_job(&self, job_id: Uuid) -> Result<Vec<ConsistencyFault>, AppError>;
}

/// Shared audit walk over the two views of one job's resumes.
pub(crate) fn audit_views(job: &Job, canonical: &[Resume]) -> Vec<ConsistencyFault> {
    let mut faults = Vec::new();
    for resume in canonical {
        match job.resumes.iter().find(|snap| snap.id == resume.id) {
            None => faults.push(ConsistencyFault::MissingEmbedded {
                resume_id: resume.id,
            }),
            Some(snap) => {
                if snap.status != resume.status {
                    faults.push(ConsistencyFault::StatusMismatch {
                        resume_id: resume.id,
                        canonical: resume.status,
                        embedded: snap.status,
                    });
                }
                if snap.file_url != resume.file_url {
                    faults.push(ConsistencyFault::FileUrlMismatch {
                        resume_id: resume.id,
                    });
                }
            }
        }
    }
    for snap in &job.resumes {
        if !canonical.iter().any(|r| r.id == snap.id) {
            faults.push(ConsistencyFault::OrphanSnapshot {
                resume_id: snap.id,
            });
        }
    }
    faults
}

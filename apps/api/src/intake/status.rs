//! Resume status state machine.
//!
//! The pipeline is forward-only: `pending` is the sole entry state and the
//! two terminal states are `shortlisted` and `rejected`. All legality lives
//! in one pure decision table, [`decide`], so the rule is exhaustively
//! testable; [`change_status`] drives the table against the store and fans
//! out on success.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Resume, ResumeStatus, UserRole};
use crate::notify::fanout;
use crate::notify::mailer::Mailer;
use crate::store::{PortalStore, StatusWrite};

/// A stale compare-and-set read means another writer finished a transition
/// first. Forward-only statuses change at most once, so one re-read always
/// reaches a terminal decision; the bound is slack, not a tuning knob.
const MAX_CAS_ATTEMPTS: usize = 3;

/// Verdict of the transition table for one
/// `(current, requested, actor_role, job_expired)` tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Legal forward transition; apply and fan out.
    Allow,
    /// Requested status equals the current one; succeed without mutating
    /// or notifying.
    Noop,
    /// Backward or sideways move; reject without mutating.
    Illegal,
    /// Agency actor on a job whose deadline has passed; rejected before
    /// legality is even considered. Admins are never gated.
    JobExpired,
}

/// The transition table. Pure; the expiry gate outranks everything else,
/// including the self-transition no-op.
pub fn decide(
    current: ResumeStatus,
    requested: ResumeStatus,
    actor_role: UserRole,
    job_expired: bool,
) -> TransitionDecision {
    if actor_role == UserRole::Agency && job_expired {
        return TransitionDecision::JobExpired;
    }
    if requested == current {
        return TransitionDecision::Noop;
    }
    match (current, requested) {
        (ResumeStatus::Pending, ResumeStatus::Shortlisted)
        | (ResumeStatus::Pending, ResumeStatus::Rejected) => TransitionDecision::Allow,
        _ => TransitionDecision::Illegal,
    }
}

#[derive(Debug, Clone)]
pub struct StatusChangeRequest {
    pub resume_id: Uuid,
    pub new_status: ResumeStatus,
    pub actor_role: UserRole,
    pub actor_id: Uuid,
}

/// Applies one status change end to end: load, decide, compare-and-set
/// both views, fan out.
///
/// Concurrent changes to the same resume serialize in the store; a stale
/// write comes back with the fresh record and the decision re-runs against
/// it, so the forward-only law holds under races. A no-op returns the
/// unchanged record without any notification.
pub async fn change_status(
    store: &dyn PortalStore,
    mailer: &Arc<dyn Mailer>,
    request: StatusChangeRequest,
) -> Result<Resume, AppError> {
    let mut current = store
        .get_resume(request.resume_id)
        .await?
        .ok_or(AppError::ResumeNotFound(request.resume_id))?;

    for _ in 0..MAX_CAS_ATTEMPTS {
        let job = store.get_job(current.job_id).await?;
        let job_expired = match &job {
            Some(job) => job.is_past_deadline(Utc::now()),
            None => {
                // Owning job was deleted after submission. The expiry gate
                // has nothing to check and fan-out has no job to name, but
                // the canonical record still transitions.
                warn!(
                    resume_id = %current.id,
                    job_id = %current.job_id,
                    "status change on a resume whose job no longer exists"
                );
                false
            }
        };

        match decide(
            current.status,
            request.new_status,
            request.actor_role,
            job_expired,
        ) {
            TransitionDecision::JobExpired => return Err(AppError::JobExpired),
            TransitionDecision::Illegal => {
                return Err(AppError::IllegalTransition {
                    from: current.status,
                    to: request.new_status,
                })
            }
            TransitionDecision::Noop => return Ok(current),
            TransitionDecision::Allow => {}
        }

        match store
            .update_resume_status(current.id, current.status, request.new_status)
            .await?
        {
            StatusWrite::Applied {
                resume,
                embedded_updated,
            } => {
                if !embedded_updated {
                    warn!(
                        resume_id = %resume.id,
                        job_id = %resume.job_id,
                        "embedded snapshot missing during status update; canonical record kept"
                    );
                }
                info!(
                    resume_id = %resume.id,
                    status = %resume.status,
                    actor_id = %request.actor_id,
                    "resume status changed"
                );
                if let Some(job) = job {
                    fanout::resume_status_changed(store, mailer, &resume, &job).await;
                }
                return Ok(resume);
            }
            StatusWrite::Stale(fresh) => {
                current = fresh;
            }
            StatusWrite::Missing => return Err(AppError::ResumeNotFound(request.resume_id)),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "status write for resume {} stayed contended past the retry budget",
        request.resume_id
    )))
}

//! In-memory `PortalStore` backend.
//!
//! Backs the test suite and the no-`DATABASE_URL` dev mode. All mutations
//! go through one `RwLock` write guard, which serializes same-resume
//! updates (coarser than the row locks `PgStore` takes, but within the
//! same contract).

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::dedup::embedded_collision;
use crate::models::{Job, Notification, Resume, ResumeStatus, User, UserRole};

use super::{audit_views, ConsistencyFault, PortalStore, StatusWrite};

#[derive(Default)]
struct MemState {
    jobs: HashMap<Uuid, Job>,
    resumes: HashMap<Uuid, Resume>,
    notifications: Vec<Notification>,
    users: HashMap<Uuid, User>,
}

#[derive(Default)]
pub struct MemStore {
    state: RwLock<MemState>,
    #[cfg(test)]
    failing_recipients: parking_lot::Mutex<std::collections::HashSet<Uuid>>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    /// Makes `insert_notification` fail for one recipient, for testing
    /// per-recipient isolation of the fan-out.
    #[cfg(test)]
    pub fn fail_notifications_for(&self, user_id: Uuid) {
        self.failing_recipients.lock().insert(user_id);
    }

    /// Drops the embedded snapshot of one resume from its owning job,
    /// fabricating the inconsistency `audit_job` is meant to detect.
    #[cfg(test)]
    pub fn strip_embedded(&self, resume_id: Uuid) {
        let mut state = self.state.write();
        let Some(job_id) = state.resumes.get(&resume_id).map(|r| r.job_id) else {
            return;
        };
        if let Some(job) = state.jobs.get_mut(&job_id) {
            job.resumes.retain(|snap| snap.id != resume_id);
        }
    }

    #[cfg(test)]
    pub fn all_notifications(&self) -> Vec<Notification> {
        self.state.read().notifications.clone()
    }
}

#[async_trait]
impl PortalStore for MemStore {
    async fn insert_job(&self, job: &Job) -> Result<(), AppError> {
        self.state.write().jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        Ok(self.state.read().jobs.get(&id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, AppError> {
        let mut jobs: Vec<Job> = self.state.read().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs)
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.state.write().jobs.remove(&id).is_some())
    }

    async fn insert_resume(&self, resume: &Resume) -> Result<(), AppError> {
        let mut state = self.state.write();
        let job = state
            .jobs
            .get(&resume.job_id)
            .ok_or(AppError::JobNotFound(resume.job_id))?;

        let canonical_hit = state
            .resumes
            .values()
            .any(|r| r.job_id == resume.job_id && r.candidate_phone == resume.candidate_phone);
        if canonical_hit || embedded_collision(&job.resumes, &resume.candidate_phone) {
            return Err(AppError::DuplicateSubmission);
        }

        let snapshot = resume.snapshot();
        state.resumes.insert(resume.id, resume.clone());
        if let Some(job) = state.jobs.get_mut(&resume.job_id) {
            job.resumes.push(snapshot);
        }
        Ok(())
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        Ok(self.state.read().resumes.get(&id).cloned())
    }

    async fn update_resume_status(
        &self,
        id: Uuid,
        expected: ResumeStatus,
        new_status: ResumeStatus,
    ) -> Result<StatusWrite, AppError> {
        let mut state = self.state.write();
        let Some(resume) = state.resumes.get_mut(&id) else {
            return Ok(StatusWrite::Missing);
        };
        if resume.status != expected {
            return Ok(StatusWrite::Stale(resume.clone()));
        }

        resume.status = new_status;
        let updated = resume.clone();

        let embedded_updated = state
            .jobs
            .get_mut(&updated.job_id)
            .and_then(|job| job.resumes.iter_mut().find(|snap| snap.id == id))
            .map(|snap| snap.status = new_status)
            .is_some();

        Ok(StatusWrite::Applied {
            resume: updated,
            embedded_updated,
        })
    }

    async fn resumes_for_agency(&self, agency_id: Uuid) -> Result<Vec<Resume>, AppError> {
        let mut resumes: Vec<Resume> = self
            .state
            .read()
            .resumes
            .values()
            .filter(|r| r.uploaded_by_agency_id == agency_id)
            .cloned()
            .collect();
        resumes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resumes)
    }

    async fn phone_exists_for_job(&self, job_id: Uuid, phone: &str) -> Result<bool, AppError> {
        let state = self.state.read();
        let canonical_hit = state
            .resumes
            .values()
            .any(|r| r.job_id == job_id && r.candidate_phone == phone);
        let embedded_hit = state
            .jobs
            .get(&job_id)
            .map(|job| embedded_collision(&job.resumes, phone))
            .unwrap_or(false);
        Ok(canonical_hit || embedded_hit)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        #[cfg(test)]
        if self
            .failing_recipients
            .lock()
            .contains(&notification.recipient_user_id)
        {
            return Err(AppError::Internal(anyhow::anyhow!(
                "injected notification failure"
            )));
        }

        self.state.write().notifications.push(notification.clone());
        Ok(())
    }

    async fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let mut notifications: Vec<Notification> = self
            .state
            .read()
            .notifications
            .iter()
            .filter(|n| n.recipient_user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_notifications_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut state = self.state.write();
        let mut flipped = 0;
        for notification in &mut state.notifications {
            if notification.recipient_user_id == user_id && !notification.read {
                notification.read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn expire_job_notifications(&self, job_ids: &[Uuid]) -> Result<u64, AppError> {
        let mut state = self.state.write();
        let mut flipped = 0;
        for notification in &mut state.notifications {
            let references_job = notification
                .job_id
                .map(|id| job_ids.contains(&id))
                .unwrap_or(false);
            if references_job && !notification.expired {
                notification.expired = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn referenced_job_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids: BTreeSet<Uuid> = self
            .state
            .read()
            .notifications
            .iter()
            .filter(|n| !n.expired)
            .filter_map(|n| n.job_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn job_deadlines(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, DateTime<Utc>)>, AppError> {
        let state = self.state.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.jobs.get(id).map(|job| (*id, job.deadline)))
            .collect())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn resolve_agency(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read();
        let by_email = state.users.values().find(|u| u.email == identifier);
        if let Some(user) = by_email {
            return Ok(Some(user.clone()));
        }
        let wanted = identifier.to_lowercase();
        Ok(state
            .users
            .values()
            .find(|u| u.role == UserRole::Agency && u.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn list_agencies(&self) -> Result<Vec<User>, AppError> {
        let mut agencies: Vec<User> = self
            .state
            .read()
            .users
            .values()
            .filter(|u| u.is_agency())
            .cloned()
            .collect();
        agencies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(agencies)
    }

    async fn ensure_user(&self, user: &User) -> Result<(), AppError> {
        let mut state = self.state.write();
        if state.users.values().any(|u| u.email == user.email) {
            return Ok(());
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn audit_job(&self, job_id: Uuid) -> Result<Vec<ConsistencyFault>, AppError> {
        let state = self.state.read();
        let job = state
            .jobs
            .get(&job_id)
            .ok_or(AppError::JobNotFound(job_id))?;
        let canonical: Vec<Resume> = state
            .resumes
            .values()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect();
        Ok(audit_views(job, &canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_agency, make_open_job, make_resume};

    #[tokio::test]
    async fn test_insert_resume_writes_both_views() {
        let store = MemStore::new();
        let job = make_open_job("Backend Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.insert_job(&job).await.unwrap();

        let resume = make_resume(&job, &agency, "9876543210");
        store.insert_resume(&resume).await.unwrap();

        let stored_job = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored_job.resumes.len(), 1);
        assert_eq!(stored_job.resumes[0].id, resume.id);
        assert!(store.audit_job(job.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_resume_rejects_same_phone_same_job() {
        let store = MemStore::new();
        let job = make_open_job("Backend Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.insert_job(&job).await.unwrap();
        store
            .insert_resume(&make_resume(&job, &agency, "9876543210"))
            .await
            .unwrap();

        let err = store
            .insert_resume(&make_resume(&job, &agency, "9876543210"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateSubmission));
        assert_eq!(store.get_job(job.id).await.unwrap().unwrap().resumes.len(), 1);
    }

    #[tokio::test]
    async fn test_same_phone_on_different_jobs_is_allowed() {
        let store = MemStore::new();
        let job_a = make_open_job("Backend Engineer");
        let job_b = make_open_job("Data Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.insert_job(&job_a).await.unwrap();
        store.insert_job(&job_b).await.unwrap();

        store
            .insert_resume(&make_resume(&job_a, &agency, "9876543210"))
            .await
            .unwrap();
        store
            .insert_resume(&make_resume(&job_b, &agency, "9876543210"))
            .await
            .unwrap();

        assert!(store.phone_exists_for_job(job_a.id, "9876543210").await.unwrap());
        assert!(store.phone_exists_for_job(job_b.id, "9876543210").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_resume_into_missing_job_fails() {
        let store = MemStore::new();
        let job = make_open_job("Backend Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        // Job never inserted.
        let err = store
            .insert_resume(&make_resume(&job, &agency, "9876543210"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::JobNotFound(id) if id == job.id));
    }

    #[tokio::test]
    async fn test_status_cas_applies_and_mirrors() {
        let store = MemStore::new();
        let job = make_open_job("Backend Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.insert_job(&job).await.unwrap();
        let resume = make_resume(&job, &agency, "9876543210");
        store.insert_resume(&resume).await.unwrap();

        let write = store
            .update_resume_status(resume.id, ResumeStatus::Pending, ResumeStatus::Shortlisted)
            .await
            .unwrap();
        let StatusWrite::Applied {
            resume: updated,
            embedded_updated,
        } = write
        else {
            panic!("expected Applied");
        };
        assert_eq!(updated.status, ResumeStatus::Shortlisted);
        assert!(embedded_updated);

        let stored_job = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored_job.resumes[0].status, ResumeStatus::Shortlisted);
        assert!(store.audit_job(job.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_cas_reports_stale_and_missing() {
        let store = MemStore::new();
        let job = make_open_job("Backend Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.insert_job(&job).await.unwrap();
        let resume = make_resume(&job, &agency, "9876543210");
        store.insert_resume(&resume).await.unwrap();
        store
            .update_resume_status(resume.id, ResumeStatus::Pending, ResumeStatus::Rejected)
            .await
            .unwrap();

        let stale = store
            .update_resume_status(resume.id, ResumeStatus::Pending, ResumeStatus::Shortlisted)
            .await
            .unwrap();
        assert!(matches!(
            stale,
            StatusWrite::Stale(r) if r.status == ResumeStatus::Rejected
        ));

        let missing = store
            .update_resume_status(Uuid::new_v4(), ResumeStatus::Pending, ResumeStatus::Rejected)
            .await
            .unwrap();
        assert!(matches!(missing, StatusWrite::Missing));
    }

    #[tokio::test]
    async fn test_delete_job_keeps_canonical_resumes() {
        let store = MemStore::new();
        let job = make_open_job("Backend Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.insert_job(&job).await.unwrap();
        let resume = make_resume(&job, &agency, "9876543210");
        store.insert_resume(&resume).await.unwrap();

        assert!(store.delete_job(job.id).await.unwrap());
        assert!(store.get_job(job.id).await.unwrap().is_none());
        assert!(store.get_resume(resume.id).await.unwrap().is_some());
        assert!(!store.delete_job(job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_read_flips_only_that_recipient() {
        let store = MemStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for recipient in [a, a, b] {
            store
                .insert_notification(&Notification::resume_status(recipient, "x".into()))
                .await
                .unwrap();
        }

        assert_eq!(store.mark_notifications_read(a).await.unwrap(), 2);
        assert_eq!(store.mark_notifications_read(a).await.unwrap(), 0);
        let for_b = store.notifications_for_user(b).await.unwrap();
        assert!(!for_b[0].read);
    }

    #[tokio::test]
    async fn test_expire_targets_only_listed_jobs() {
        let store = MemStore::new();
        let recipient = Uuid::new_v4();
        let job_a = make_open_job("A");
        let job_b = make_open_job("B");
        store
            .insert_notification(&Notification::new_job(
                recipient,
                "A posted".into(),
                job_a.id,
                job_a.deadline,
            ))
            .await
            .unwrap();
        store
            .insert_notification(&Notification::new_job(
                recipient,
                "B posted".into(),
                job_b.id,
                job_b.deadline,
            ))
            .await
            .unwrap();

        assert_eq!(store.expire_job_notifications(&[job_a.id]).await.unwrap(), 1);
        // Second pass finds nothing new to flip.
        assert_eq!(store.expire_job_notifications(&[job_a.id]).await.unwrap(), 0);
        assert_eq!(store.referenced_job_ids().await.unwrap(), vec![job_b.id]);
    }

    #[tokio::test]
    async fn test_resolve_agency_prefers_email_then_name() {
        let store = MemStore::new();
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.ensure_user(&agency).await.unwrap();

        let by_email = store.resolve_agency("acme@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, agency.id);
        let by_name = store.resolve_agency("ACME staffing").await.unwrap().unwrap();
        assert_eq!(by_name.id, agency.id);
        assert!(store.resolve_agency("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_name_resolution_skips_admins() {
        let store = MemStore::new();
        let admin = crate::test_support::make_admin("root@example.com");
        store.ensure_user(&admin).await.unwrap();

        // Admins resolve by email (the legacy lookup is unfiltered there)
        // but never by name.
        assert!(store.resolve_agency("admin").await.unwrap().is_none());
        assert!(store.resolve_agency("root@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent_per_email() {
        let store = MemStore::new();
        let first = make_agency("Acme Staffing", "acme@example.com");
        let second = make_agency("Acme Rebranded", "acme@example.com");
        store.ensure_user(&first).await.unwrap();
        store.ensure_user(&second).await.unwrap();

        let agencies = store.list_agencies().await.unwrap();
        assert_eq!(agencies.len(), 1);
        assert_eq!(agencies[0].name, "Acme Staffing");
    }

    #[tokio::test]
    async fn test_audit_detects_stripped_snapshot() {
        let store = MemStore::new();
        let job = make_open_job("Backend Engineer");
        let agency = make_agency("Acme Staffing", "acme@example.com");
        store.insert_job(&job).await.unwrap();
        let resume = make_resume(&job, &agency, "9876543210");
        store.insert_resume(&resume).await.unwrap();

        store.strip_embedded(resume.id);

        let faults = store.audit_job(job.id).await.unwrap();
        assert_eq!(
            faults,
            vec![ConsistencyFault::MissingEmbedded {
                resume_id: resume.id
            }]
        );
    }
}

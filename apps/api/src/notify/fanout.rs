//! Notification fan-out for job creation and resume status changes.
//!
//! Everything here is best-effort relative to the triggering mutation: a
//! notification that fails to persist is logged and the loop moves on to
//! the next recipient, and emails go out on spawned tasks so no HTTP
//! response ever waits on the mail transport.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::models::{Job, Notification, Resume};
use crate::notify::mailer::Mailer;
use crate::notify::templates::{self, Email};
use crate::store::PortalStore;

/// Fans a freshly created job out to every agency: one `new_job`
/// notification each, carrying the job id and deadline, then a best-effort
/// announcement email.
pub async fn job_created(store: &dyn PortalStore, mailer: &Arc<dyn Mailer>, job: &Job) {
    let agencies = match store.list_agencies().await {
        Ok(agencies) => agencies,
        Err(err) => {
            error!(job_id = %job.id, "could not list agencies for job fan-out: {err}");
            return;
        }
    };
    info!(job_id = %job.id, agencies = agencies.len(), "fanning out new job");

    let message = templates::new_job_message(job);
    for agency in agencies {
        let notification = Notification::new_job(agency.id, message.clone(), job.id, job.deadline);
        if let Err(err) = store.insert_notification(&notification).await {
            error!(agency = %agency.email, "failed to persist new-job notification: {err}");
        }
        send_in_background(mailer, agency.email, templates::new_job_email(job));
    }
}

/// Tells the agency that submitted the resume about its new status. The
/// candidate is never contacted. The agency is re-read so the email goes
/// to its current address, not the snapshot taken at submission time; if
/// the account is gone there is nobody to notify.
pub async fn resume_status_changed(
    store: &dyn PortalStore,
    mailer: &Arc<dyn Mailer>,
    resume: &Resume,
    job: &Job,
) {
    let agency = match store.get_user(resume.uploaded_by_agency_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(
                resume_id = %resume.id,
                agency_id = %resume.uploaded_by_agency_id,
                "submitting agency no longer exists; skipping status fan-out"
            );
            return;
        }
        Err(err) => {
            error!(resume_id = %resume.id, "could not load agency for status fan-out: {err}");
            return;
        }
    };

    let message = templates::resume_status_message(resume, &job.title);
    let notification = Notification::resume_status(agency.id, message);
    if let Err(err) = store.insert_notification(&notification).await {
        error!(agency = %agency.email, "failed to persist status notification: {err}");
    }
    send_in_background(
        mailer,
        agency.email,
        templates::resume_status_email(resume, &job.title),
    );
}

/// Fire-and-forget delivery; failures surface only in the log.
fn send_in_background(mailer: &Arc<dyn Mailer>, to: String, email: Email) {
    let mailer = Arc::clone(mailer);
    tokio::spawn(async move {
        if let Err(err) = mailer.send(&to, &email.subject, &email.html).await {
            error!(%to, subject = %email.subject, "email delivery failed: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use crate::store::MemStore;
    use crate::test_support::{make_agency, make_open_job, make_resume, RecordingMailer};

    #[tokio::test]
    async fn test_job_fan_out_reaches_every_agency_once() {
        let store = MemStore::new();
        let a = make_agency("Acme Staffing", "acme@example.com");
        let b = make_agency("Bright Hires", "bright@example.com");
        store.ensure_user(&a).await.unwrap();
        store.ensure_user(&b).await.unwrap();
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer::new());
        let job = make_open_job("Backend Engineer");

        job_created(&store, &mailer, &job).await;

        for agency in [&a, &b] {
            let notifications = store.notifications_for_user(agency.id).await.unwrap();
            assert_eq!(notifications.len(), 1);
            let n = &notifications[0];
            assert_eq!(n.kind, NotificationKind::NewJob);
            assert_eq!(n.job_id, Some(job.id));
            assert_eq!(n.job_deadline, Some(job.deadline));
            assert_eq!(n.message, "A new job has been posted: Backend Engineer");
        }
    }

    #[tokio::test]
    async fn test_admins_are_not_fanned_out_to() {
        let store = MemStore::new();
        let admin = crate::test_support::make_admin("root@example.com");
        store.ensure_user(&admin).await.unwrap();
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer::new());

        job_created(&store, &mailer, &make_open_job("Backend Engineer")).await;

        assert!(store
            .notifications_for_user(admin.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_recipient_does_not_stop_the_rest() {
        let store = MemStore::new();
        let a = make_agency("Acme Staffing", "acme@example.com");
        let b = make_agency("Bright Hires", "bright@example.com");
        store.ensure_user(&a).await.unwrap();
        store.ensure_user(&b).await.unwrap();
        store.fail_notifications_for(a.id);
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer::new());

        job_created(&store, &mailer, &make_open_job("Backend Engineer")).await;

        assert!(store.notifications_for_user(a.id).await.unwrap().is_empty());
        assert_eq!(store.notifications_for_user(b.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_fan_out_skips_a_deleted_agency() {
        let store = MemStore::new();
        let agency = make_agency("Acme Staffing", "acme@example.com");
        // Agency never stored: simulates an account deleted after submission.
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer::new());
        let job = make_open_job("Backend Engineer");
        let resume = make_resume(&job, &agency, "9876543210");

        resume_status_changed(&store, &mailer, &resume, &job).await;

        assert!(store.all_notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_emails_are_delivered_off_the_request_path() {
        let store = MemStore::new();
        let a = make_agency("Acme Staffing", "acme@example.com");
        let b = make_agency("Bright Hires", "bright@example.com");
        store.ensure_user(&a).await.unwrap();
        store.ensure_user(&b).await.unwrap();
        let recorder = Arc::new(RecordingMailer::new());
        let mailer: Arc<dyn Mailer> = recorder.clone();

        job_created(&store, &mailer, &make_open_job("Backend Engineer")).await;
        // Sends run on spawned tasks; yield until they finish.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.subject == "New Job Posted: Backend Engineer"));
        let recipients: Vec<&str> = sent.iter().map(|m| m.to.as_str()).collect();
        assert!(recipients.contains(&"acme@example.com"));
        assert!(recipients.contains(&"bright@example.com"));
    }
}

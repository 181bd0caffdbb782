use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
pub enum NotificationKind {
    NewJob,
    ResumeStatus,
}

/// In-app notification record. `message` is fully rendered text, not a
/// template reference. `job_id`/`job_deadline` are set for `NewJob`
/// notifications only; `expired` is maintained by the delete-job cascade
/// and the out-of-band sweep (`notify::sweep`), not computed on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_user_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub job_id: Option<Uuid>,
    pub job_deadline: Option<DateTime<Utc>>,
    pub expired: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Notification announcing a freshly posted job to one agency.
    pub fn new_job(
        recipient_user_id: Uuid,
        message: String,
        job_id: Uuid,
        deadline: DateTime<Utc>,
    ) -> Self {
        Notification {
            id: Uuid::new_v4(),
            recipient_user_id,
            message,
            kind: NotificationKind::NewJob,
            read: false,
            job_id: Some(job_id),
            job_deadline: Some(deadline),
            expired: false,
            created_at: Utc::now(),
        }
    }

    /// Notification telling the submitting agency about a status change.
    /// Carries no job reference; only `NewJob` notifications expire.
    pub fn resume_status(recipient_user_id: Uuid, message: String) -> Self {
        Notification {
            id: Uuid::new_v4(),
            recipient_user_id,
            message,
            kind: NotificationKind::ResumeStatus,
            read: false,
            job_id: None,
            job_deadline: None,
            expired: false,
            created_at: Utc::now(),
        }
    }
}

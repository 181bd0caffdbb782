//! Postgres `PortalStore` backend.
//!
//! Embedded snapshots live in a `jsonb` column on `jobs`; dual writes run
//! in one transaction with the job row locked `FOR UPDATE`, so concurrent
//! mutations touching the same job serialize while distinct jobs proceed
//! in parallel.
//!
//! Lock order: a status update locks the resume row, then the job row; an
//! insert locks only the job row. No path takes the locks in the opposite
//! order, so the two cannot deadlock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::dedup::embedded_collision;
use crate::models::{EmbeddedResume, Job, JobStatus, Notification, Resume, ResumeStatus, User};

use super::{audit_views, ConsistencyFault, PortalStore, StatusWrite};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape of `jobs`; the snapshot column decodes through `Json`.
#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    description: String,
    deadline: DateTime<Utc>,
    status: JobStatus,
    resumes: Json<Vec<EmbeddedResume>>,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            title: row.title,
            description: row.description,
            deadline: row.deadline,
            status: row.status,
            resumes: row.resumes.0,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PortalStore for PgStore {
    async fn insert_job(&self, job: &Job) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, title, description, deadline, status, resumes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.deadline)
        .bind(job.status)
        .bind(Json(&job.resumes))
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Job::from))
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, AppError> {
        let rows = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Job::from).collect())
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_resume(&self, resume: &Resume) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(resume.job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::JobNotFound(resume.job_id))?;

        let canonical_hit: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM resumes WHERE job_id = $1 AND candidate_phone = $2)",
        )
        .bind(resume.job_id)
        .bind(&resume.candidate_phone)
        .fetch_one(&mut *tx)
        .await?;

        if canonical_hit || embedded_collision(&job.resumes.0, &resume.candidate_phone) {
            return Err(AppError::DuplicateSubmission);
        }

        sqlx::query(
            r#"
            INSERT INTO resumes
                (id, candidate_name, candidate_email, candidate_phone, file_url, job_id,
                 status, uploaded_by_agency_id, uploaded_by_agency_name,
                 uploaded_by_agency_email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(resume.id)
        .bind(&resume.candidate_name)
        .bind(&resume.candidate_email)
        .bind(&resume.candidate_phone)
        .bind(&resume.file_url)
        .bind(resume.job_id)
        .bind(resume.status)
        .bind(resume.uploaded_by_agency_id)
        .bind(&resume.uploaded_by_agency_name)
        .bind(&resume.uploaded_by_agency_email)
        .bind(resume.created_at)
        .execute(&mut *tx)
        .await?;

        let mut snapshots = job.resumes.0;
        snapshots.push(resume.snapshot());
        sqlx::query("UPDATE jobs SET resumes = $1 WHERE id = $2")
            .bind(Json(&snapshots))
            .bind(resume.job_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        Ok(
            sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_resume_status(
        &self,
        id: Uuid,
        expected: ResumeStatus,
        new_status: ResumeStatus,
    ) -> Result<StatusWrite, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) =
            sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(StatusWrite::Missing);
        };
        if current.status != expected {
            return Ok(StatusWrite::Stale(current));
        }

        sqlx::query("UPDATE resumes SET status = $1 WHERE id = $2")
            .bind(new_status)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(current.job_id)
            .fetch_optional(&mut *tx)
            .await?;

        let mut embedded_updated = false;
        if let Some(job) = job {
            let mut snapshots = job.resumes.0;
            if let Some(snap) = snapshots.iter_mut().find(|snap| snap.id == id) {
                snap.status = new_status;
                embedded_updated = true;
                sqlx::query("UPDATE jobs SET resumes = $1 WHERE id = $2")
                    .bind(Json(&snapshots))
                    .bind(current.job_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(StatusWrite::Applied {
            resume: Resume {
                status: new_status,
                ..current
            },
            embedded_updated,
        })
    }

    async fn resumes_for_agency(&self, agency_id: Uuid) -> Result<Vec<Resume>, AppError> {
        Ok(sqlx::query_as::<_, Resume>(
            "SELECT * FROM resumes WHERE uploaded_by_agency_id = $1 ORDER BY created_at DESC",
        )
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn phone_exists_for_job(&self, job_id: Uuid, phone: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM resumes WHERE job_id = $1 AND candidate_phone = $2
            ) OR EXISTS(
                SELECT 1
                FROM jobs, jsonb_array_elements(jobs.resumes) AS snap
                WHERE jobs.id = $1 AND snap->>'candidate_phone' = $2
            )
            "#,
        )
        .bind(job_id)
        .bind(phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, recipient_user_id, message, kind, read, job_id, job_deadline,
                 expired, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient_user_id)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.read)
        .bind(notification.job_id)
        .bind(notification.job_deadline)
        .bind(notification.expired)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        Ok(sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE recipient_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn mark_notifications_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE recipient_user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn expire_job_notifications(&self, job_ids: &[Uuid]) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET expired = TRUE
            WHERE kind = 'new_job' AND expired = FALSE AND job_id = ANY($1)
            "#,
        )
        .bind(job_ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn referenced_job_ids(&self) -> Result<Vec<Uuid>, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT DISTINCT job_id FROM notifications
            WHERE kind = 'new_job' AND expired = FALSE AND job_id IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn job_deadlines(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, DateTime<Utc>)>, AppError> {
        Ok(
            sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
                "SELECT id, deadline FROM jobs WHERE id = ANY($1)",
            )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?,
        )
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn resolve_agency(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let by_email = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        if by_email.is_some() {
            return Ok(by_email);
        }

        Ok(sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'agency' AND LOWER(name) = LOWER($1) LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_agencies(&self) -> Result<Vec<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = 'agency' ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn ensure_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn audit_job(&self, job_id: Uuid) -> Result<Vec<ConsistencyFault>, AppError> {
        let job = self
            .get_job(job_id)
            .await?
            .ok_or(AppError::JobNotFound(job_id))?;
        let canonical =
            sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE job_id = $1")
                .bind(job_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(audit_views(&job, &canonical))
    }
}

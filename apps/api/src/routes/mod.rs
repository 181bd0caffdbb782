pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::intake::handlers as intake;
use crate::jobs::handlers as jobs;
use crate::notify::handlers as notify;
use crate::state::AppState;

/// Multipart uploads carry a whole PDF; the axum default of 2 MB is too
/// tight for scanned resumes.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route(
            "/api/jobs/:job_id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        .route(
            "/api/jobs/:job_id/resumes",
            post(intake::handle_submit_resume).get(intake::handle_job_resumes),
        )
        // Resumes
        .route(
            "/api/resumes/:id/status",
            patch(intake::handle_update_resume_status),
        )
        // Agencies
        .route("/api/agencies", get(intake::handle_list_agencies))
        .route(
            "/api/agencies/:agency_id/resumes",
            get(intake::handle_agency_resumes),
        )
        // Notifications
        .route(
            "/api/notifications",
            get(notify::handle_list_notifications),
        )
        .route(
            "/api/notifications/mark-read",
            post(notify::handle_mark_notifications_read),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

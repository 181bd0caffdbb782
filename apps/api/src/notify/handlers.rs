use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Notification;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/notifications?user_id=…
///
/// Every notification for one recipient, newest first. Read and expired
/// flags come back as stored; the client decides how to render them.
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state.store.notifications_for_user(query.user_id).await?;
    Ok(Json(notifications))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// POST /api/notifications/mark-read
///
/// Bulk-flags every unread notification of the given recipient as read.
pub async fn handle_mark_notifications_read(
    State(state): State<AppState>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let updated = state.store.mark_notifications_read(request.user_id).await?;
    Ok(Json(MarkReadResponse { updated }))
}

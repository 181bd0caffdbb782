//! Expiry sweep for `new_job` notifications.
//!
//! A `new_job` notification is expired once its job is deleted or the
//! job's deadline passes. Deletion flips the flag synchronously in the
//! delete path; the sweep is the out-of-band pass that also catches
//! deadlines rolling over, running on an interval from `main`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::PortalStore;

/// One sweep pass: find every job still referenced by a live `new_job`
/// notification, then expire the notifications whose job is gone or past
/// its deadline. Returns how many notifications were flipped.
pub async fn mark_expired_notifications(
    store: &dyn PortalStore,
    now: DateTime<Utc>,
) -> Result<u64, AppError> {
    let referenced = store.referenced_job_ids().await?;
    if referenced.is_empty() {
        return Ok(0);
    }

    let live: HashMap<Uuid, DateTime<Utc>> =
        store.job_deadlines(&referenced).await?.into_iter().collect();

    let expired: Vec<Uuid> = referenced
        .into_iter()
        .filter(|id| match live.get(id) {
            None => true,
            Some(deadline) => *deadline < now,
        })
        .collect();

    if expired.is_empty() {
        return Ok(0);
    }

    let flipped = store.expire_job_notifications(&expired).await?;
    info!(
        jobs = expired.len(),
        notifications = flipped,
        "expired stale job notifications"
    );
    Ok(flipped)
}

/// Interval loop around [`mark_expired_notifications`]; the first pass
/// runs immediately. Never returns.
pub async fn run(store: Arc<dyn PortalStore>, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;
        if let Err(err) = mark_expired_notifications(store.as_ref(), Utc::now()).await {
            error!("notification sweep failed: {err}");
        }
    }
}

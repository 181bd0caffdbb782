use std::sync::Arc;

use crate::blob::BlobStore;
use crate::notify::mailer::Mailer;
use crate::store::PortalStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The three trait objects are chosen at startup: Postgres or in-memory
/// store, S3 or local-filesystem blobs, HTTP or console mailer.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PortalStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub mailer: Arc<dyn Mailer>,
}

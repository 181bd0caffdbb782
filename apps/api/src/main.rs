mod blob;
mod config;
mod db;
mod errors;
mod extract;
mod intake;
mod jobs;
mod models;
mod notify;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::services::ServeDir;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::blob::{BlobStore, FsBlobStore, S3BlobStore};
use crate::config::{Config, S3Config};
use crate::db::create_pool;
use crate::models::{User, UserRole};
use crate::notify::mailer::{ConsoleMailer, HttpMailer, Mailer};
use crate::notify::sweep;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemStore, PgStore, PortalStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talentgate API v{}", env!("CARGO_PKG_VERSION"));

    // Store: PostgreSQL when configured, in-memory otherwise
    let store: Arc<dyn PortalStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
            Arc::new(MemStore::new())
        }
    };

    // Seed the admin account when configured
    if let Some(email) = &config.admin_email {
        store
            .ensure_user(&User {
                id: Uuid::new_v4(),
                name: config.admin_name.clone(),
                email: email.clone(),
                role: UserRole::Admin,
            })
            .await?;
        info!("Admin account ensured for {email}");
    }

    // Blob storage: S3 / MinIO when configured, local uploads dir otherwise
    let (blobs, uploads_root): (Arc<dyn BlobStore>, Option<PathBuf>) = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("S3 client initialized (bucket: {})", s3.bucket);
            (
                Arc::new(S3BlobStore::new(
                    client,
                    s3.bucket.clone(),
                    s3.endpoint.clone(),
                )),
                None,
            )
        }
        None => {
            let fs = FsBlobStore::new(config.upload_dir.clone()).await?;
            let root = fs.root().to_path_buf();
            info!("Storing uploads under {}", root.display());
            (Arc::new(fs), Some(root))
        }
    };

    // Mail transport: HTTP API when configured, console logging otherwise
    let mailer: Arc<dyn Mailer> = match &config.mail {
        Some(mail) => {
            info!("Mail transport configured ({})", mail.api_url);
            Arc::new(HttpMailer::new(
                mail.api_url.clone(),
                mail.api_key.clone(),
                mail.from.clone(),
            ))
        }
        None => {
            warn!("MAIL_API_URL not set; emails will be logged, not sent");
            Arc::new(ConsoleMailer)
        }
    };

    // Background sweep that expires stale new-job notifications
    tokio::spawn(sweep::run(Arc::clone(&store), config.sweep_interval_secs));

    // Build app state
    let state = AppState {
        store,
        blobs,
        mailer,
    };

    // Build router
    let mut app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    // Serve uploaded files directly when they live on the local disk
    if let Some(root) = uploads_root {
        app = app.nest_service("/uploads", ServeDir::new(root));
    }

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "talentgate-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

use anyhow::{Context, Result};

/// S3 settings. Present only when `S3_BUCKET` is set; the remaining
/// variables are then required.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// SMTP-less mail settings: an HTTP transactional-mail API endpoint.
/// Present only when `MAIL_API_URL` is set.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

/// Application configuration loaded from environment variables.
///
/// Every backend degrades gracefully when unconfigured: no `DATABASE_URL`
/// means the in-memory store, no `S3_BUCKET` means local-disk uploads, no
/// `MAIL_API_URL` means emails are logged instead of sent. This keeps a
/// bare `cargo run` useful for development.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub s3: Option<S3Config>,
    pub mail: Option<MailConfig>,
    pub upload_dir: String,
    pub admin_email: Option<String>,
    pub admin_name: String,
    pub sweep_interval_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3 = match std::env::var("S3_BUCKET") {
            Ok(bucket) => Some(S3Config {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            Err(_) => None,
        };

        let mail = match std::env::var("MAIL_API_URL") {
            Ok(api_url) => Some(MailConfig {
                api_url,
                api_key: require_env("MAIL_API_KEY")?,
                from: std::env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "no-reply@talentgate.local".to_string()),
            }),
            Err(_) => None,
        };

        Ok(Config {
            database_url: std::env::var("DATABASE_URL").ok(),
            s3,
            mail,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            admin_email: std::env::var("ADMIN_EMAIL").ok(),
            admin_name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<u64>()
                .context("SWEEP_INTERVAL_SECS must be a number of seconds")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

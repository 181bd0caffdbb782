//! Outbound email capability.
//!
//! The fan-out only ever needs `send(to, subject, html)`; everything about
//! the transport hides behind the trait. `HttpMailer` posts to a
//! transactional-mail HTTP API. `ConsoleMailer` logs the rendered message
//! and takes over when no mail credentials are configured, so the rest of
//! the workflow behaves identically in dev.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Posts messages to a transactional-mail HTTP API. Single attempt per
/// message; every send is best-effort and the caller logs failures.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let body = MailRequest {
            from: &self.from,
            to,
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Logs messages instead of delivering them.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), MailError> {
        info!(%to, %subject, "mail transport not configured; logging message instead");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_request_serializes_flat() {
        let body = MailRequest {
            from: "no-reply@talentgate.local",
            to: "acme@example.com",
            subject: "New Job Posted: Backend Engineer",
            html: "<p>hi</p>",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["from"], "no-reply@talentgate.local");
        assert_eq!(json["to"], "acme@example.com");
        assert_eq!(json["subject"], "New Job Posted: Backend Engineer");
        assert_eq!(json["html"], "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_console_mailer_always_succeeds() {
        let mailer = ConsoleMailer;
        mailer
            .send("acme@example.com", "subject", "<p>body</p>")
            .await
            .unwrap();
    }
}

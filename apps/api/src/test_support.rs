//! Shared fixtures for workflow tests: users, jobs, resumes, a recording
//! mailer, and a minimal one-page PDF builder for extraction tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::{Job, JobStatus, Resume, ResumeStatus, User, UserRole};
use crate::notify::mailer::{MailError, Mailer};

pub fn make_agency(name: &str, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        role: UserRole::Agency,
    }
}

pub fn make_admin(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: "Admin".to_string(),
        email: email.to_string(),
        role: UserRole::Admin,
    }
}

pub fn make_job(title: &str, deadline: DateTime<Utc>) -> Job {
    Job {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{title} role, apply via your agency."),
        deadline,
        status: JobStatus::Open,
        resumes: vec![],
        created_at: Utc::now(),
    }
}

/// Job whose deadline is tomorrow.
pub fn make_open_job(title: &str) -> Job {
    make_job(title, Utc::now() + Duration::days(1))
}

/// Job whose deadline passed yesterday.
pub fn make_expired_job(title: &str) -> Job {
    make_job(title, Utc::now() - Duration::days(1))
}

pub fn make_resume(job: &Job, agency: &User, phone: &str) -> Resume {
    Resume {
        id: Uuid::new_v4(),
        candidate_name: Some("Asha Rao".to_string()),
        candidate_email: None,
        candidate_phone: phone.to_string(),
        file_url: format!("/uploads/{}.pdf", Uuid::new_v4().simple()),
        job_id: job.id,
        status: ResumeStatus::Pending,
        uploaded_by_agency_id: agency.id,
        uploaded_by_agency_name: agency.name.clone(),
        uploaded_by_agency_email: agency.email.clone(),
        created_at: Utc::now(),
    }
}

// ── mailer double ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mailer that records every send instead of talking to a transport.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        RecordingMailer::default()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        self.sent.lock().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

// ── minimal PDF builder ──────────────────────────────────────────────

/// Builds a valid single-page PDF whose page shows `text` in Helvetica.
/// Offsets in the xref table are computed from the actual byte positions,
/// so strict parsers accept the output.
pub fn sample_pdf(text: &str) -> Vec<u8> {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)");
    let content = format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, body));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    pdf.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_pdf_has_magic_and_trailer() {
        let bytes = sample_pdf("hello");
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("(hello) Tj"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_sample_pdf_escapes_parentheses() {
        let bytes = sample_pdf("a (b) c");
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("(a \\(b\\) c) Tj"));
    }

    #[test]
    fn test_xref_points_at_first_object() {
        let text = String::from_utf8(sample_pdf("x")).unwrap();
        // First object starts right after the 9-byte header line.
        assert!(text.contains("0000000009 00000 n \n"));
    }
}

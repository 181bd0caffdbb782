//! Rendered notification messages and email bodies.
//!
//! Notifications store the final text, not a template reference, so the
//! wording lives here in one place.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::models::{Job, Resume};

/// A rendered outbound email.
#[derive(Debug, Clone)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

pub fn new_job_message(job: &Job) -> String {
    format!("A new job has been posted: {}", job.title)
}

pub fn new_job_email(job: &Job) -> Email {
    Email {
        subject: format!("New Job Posted: {}", job.title),
        html: format!(
            "<h2>A new job has been posted</h2>\n\
             <p><b>Title:</b> {}</p>\n\
             <p><b>Description:</b><br>{}</p>\n\
             <p><b>Applicable till:</b> {}</p>",
            job.title,
            linkify(&job.description),
            human_deadline(job.deadline),
        ),
    }
}

pub fn resume_status_message(resume: &Resume, job_title: &str) -> String {
    let phone = display_phone(resume);
    let status = resume.status;
    match file_name_from_url(&resume.file_url) {
        Some(file) => format!(
            "A resume you submitted (Phone: {phone}, File: {file}) has been {status} for job: {job_title}."
        ),
        None => format!(
            "A resume you submitted (Phone: {phone}) has been {status} for job: {job_title}."
        ),
    }
}

pub fn resume_status_email(resume: &Resume, job_title: &str) -> Email {
    let status = resume.status.as_str();
    Email {
        subject: format!("Resume {} for Job: {}", capitalize(status), job_title),
        html: format!(
            "<h2>Resume Status Update</h2>\n\
             <p>Your submitted resume has been <b>{status}</b> for the job: <b>{job_title}</b>.</p>\n\
             <ul>\n\
             <li><b>Phone:</b> {}</li>\n\
             <li><b>File:</b> {}</li>\n\
             </ul>\n\
             <p>Thank you</p>",
            display_phone(resume),
            file_name_from_url(&resume.file_url).unwrap_or("-"),
        ),
    }
}

/// Turns bare `http(s)://` URLs in free text into styled anchors for the
/// email body.
pub fn linkify(text: &str) -> String {
    link_pattern()
        .replace_all(
            text,
            "<a href=\"$1\" style=\"color:#1976d2;text-decoration:underline;\" target=\"_blank\">$1</a>",
        )
        .into_owned()
}

fn link_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(https?://[^\s]+)").expect("link pattern is valid"))
}

fn display_phone(resume: &Resume) -> &str {
    if resume.candidate_phone.is_empty() {
        "-"
    } else {
        &resume.candidate_phone
    }
}

fn file_name_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|name| !name.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn human_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%a, %d %b %Y %H:%M UTC").to_string()
}

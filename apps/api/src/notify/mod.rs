//! Notification fan-out, outbound email, message templates, and the
//! expiry sweep.

pub mod fanout;
pub mod handlers;
pub mod mailer;
pub mod sweep;
pub mod templates;

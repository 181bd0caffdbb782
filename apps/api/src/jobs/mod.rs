//! Job postings: lifecycle services and their HTTP handlers.

pub mod handlers;
pub mod lifecycle;

//! Phone-number scanning over extracted resume text.

use regex::Regex;
use std::sync::OnceLock;

/// An optional international prefix (`+` and up to 3 digits, optionally
/// separated by a space or hyphen) followed by a 10-digit subscriber
/// number.
pub const PHONE_PATTERN: &str = r"(\+\d{1,3}[- ]?)?\d{10}";

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
}

/// Returns the first phone-shaped substring in document order, if any.
pub fn first_phone(text: &str) -> Option<&str> {
    phone_regex().find(text).map(|m| m.as_str())
}

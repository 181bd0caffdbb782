//! Resume intake: the submission pipeline, duplicate rule, and the status state machine.

pub mod dedup;
pub mod handlers;
pub mod status;
pub mod submit;

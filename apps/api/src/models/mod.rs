pub mod job;
pub mod notification;
pub mod resume;
pub mod user;

pub use job::{EmbeddedResume, Job, JobStatus};
pub use notification::{Notification, NotificationKind};
pub use resume::{Resume, ResumeStatus};
pub use user::{User, UserRole};

//! Domain logic for questionnaire assignment and response collection
//!
//! - `progress` - Session cursor state machine (pure)
//! - `sessions` - Assignment, answer submission and session views
//! - `audit` - Best-effort audit trail and activity rendering
//! - `users` - Account creation, username derivation and credential checks

pub mod audit;
pub mod progress;
pub mod sessions;
pub mod users;

pub use audit::{ActivityItem, AuditAction, AuditEntry, AuditObject};
pub use progress::{Progress, ProgressState};
pub use sessions::{Assignment, SessionDetail, SessionError, SessionView, SubmittedAnswer};
pub use users::{CreateUser, UserError};

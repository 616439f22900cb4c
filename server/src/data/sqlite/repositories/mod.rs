//! SQLite repositories
//!
//! Types (UserRow, SessionRow, etc.) should be imported from `crate::data::types`.

pub mod audit;
pub mod questionnaire;
pub mod session;
pub mod stats;
pub mod user;

pub use audit::{insert_audit_log, list_recent as list_recent_audit_logs};
pub use questionnaire::{
    count_questions, create_questionnaire, delete_questionnaire, get_question, get_questionnaire,
    list_questionnaires, list_questions,
};
pub use session::{
    get_current_session, get_user_session, list_responses, list_session_answers,
    override_session_progress, record_answer, upsert_session,
};
pub use stats::dashboard_counts;
pub use user::{
    create_user, current_questionnaire_id, get_by_email, get_user, list_users, set_user_active,
    username_exists,
};

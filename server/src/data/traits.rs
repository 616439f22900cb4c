//! Repository trait for the transactional store
//!
//! Domain services and route handlers talk to storage only through
//! `TransactionalRepository`, so the SQLite backend can be swapped or faked.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{
    AnswerRow, AuditLogRow, DashboardCounts, NewAnswer, NewAuditLog, NewQuestionnaire, NewUser,
    QuestionRow, QuestionnaireRow, QuestionnaireWithQuestions, ResponseRow, SessionAnswerRow,
    SessionRow, UserRow, UserWithAssignment,
};

/// Repository trait for transactional operations (users, questionnaires, sessions, audit)
#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    // ==================== User Operations ====================

    /// Create a new user. Fails with `Conflict` on a duplicate email or username.
    async fn create_user(&self, new: &NewUser) -> Result<UserRow, DataError>;

    /// Get a user by ID
    async fn get_user(&self, id: &str) -> Result<Option<UserRow>, DataError>;

    /// Get a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, DataError>;

    /// Check whether a username is taken
    async fn username_exists(&self, username: &str) -> Result<bool, DataError>;

    /// List all users newest first, with their current questionnaire
    async fn list_users(&self) -> Result<Vec<UserWithAssignment>, DataError>;

    /// Questionnaire id of the user's current in-progress session
    async fn current_questionnaire_id(&self, user_id: &str) -> Result<Option<String>, DataError>;

    /// Set a user's active flag
    async fn set_user_active(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<Option<UserRow>, DataError>;

    // ==================== Questionnaire Operations ====================

    /// Create a questionnaire and its questions atomically
    async fn create_questionnaire(
        &self,
        new: &NewQuestionnaire,
    ) -> Result<QuestionnaireWithQuestions, DataError>;

    /// Get a questionnaire by ID
    async fn get_questionnaire(&self, id: &str) -> Result<Option<QuestionnaireRow>, DataError>;

    /// List all questionnaires newest first, with ordered questions
    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireWithQuestions>, DataError>;

    /// List a questionnaire's questions in presentation order
    async fn list_questions(&self, questionnaire_id: &str) -> Result<Vec<QuestionRow>, DataError>;

    /// Get a question scoped to its questionnaire
    async fn get_question(
        &self,
        questionnaire_id: &str,
        question_id: &str,
    ) -> Result<Option<QuestionRow>, DataError>;

    /// Count a questionnaire's questions
    async fn count_questions(&self, questionnaire_id: &str) -> Result<i64, DataError>;

    /// Delete a questionnaire (cascades to questions, sessions, answers)
    async fn delete_questionnaire(&self, id: &str) -> Result<bool, DataError>;

    // ==================== Session Operations ====================

    /// Create or reset the session for a (user, questionnaire) pair
    async fn upsert_session(
        &self,
        user_id: &str,
        questionnaire_id: &str,
        total_questions: i64,
    ) -> Result<SessionRow, DataError>;

    /// Get a session owned by the given user
    async fn get_user_session(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<SessionRow>, DataError>;

    /// The user's most recently updated incomplete session
    async fn get_current_session(&self, user_id: &str) -> Result<Option<SessionRow>, DataError>;

    /// Overwrite cursor and/or completion flag
    async fn override_session_progress(
        &self,
        id: &str,
        user_id: &str,
        current_index: Option<i64>,
        is_completed: Option<bool>,
    ) -> Result<Option<SessionRow>, DataError>;

    /// Append an answer and compare-and-swap the session cursor
    async fn record_answer(&self, new: &NewAnswer) -> Result<AnswerRow, DataError>;

    /// Answers of a session in submission order
    async fn list_session_answers(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionAnswerRow>, DataError>;

    /// All answers, newest first
    async fn list_responses(&self) -> Result<Vec<ResponseRow>, DataError>;

    // ==================== Audit Operations ====================

    /// Append an audit entry
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> Result<i64, DataError>;

    /// Most recent audit entries, newest first
    async fn list_recent_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogRow>, DataError>;

    // ==================== Stats Operations ====================

    /// Raw table counts
    async fn dashboard_counts(&self) -> Result<DashboardCounts, DataError>;
}

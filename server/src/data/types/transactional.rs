//! Row types for the transactional (SQLite) store

use std::fmt;

use serde::{Deserialize, Serialize};

use super::enums::{QuestionType, UserRole};

// ============================================================================
// User types
// ============================================================================

/// User row from database
#[derive(Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRow {
    pub fn role(&self) -> UserRole {
        UserRole::from_is_admin(self.is_admin)
    }

    /// Full name, or the username when no name parts are set
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl fmt::Debug for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("is_admin", &self.is_admin)
            .field("is_active", &self.is_active)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// User joined with their current in-progress questionnaire
#[derive(Debug, Clone)]
pub struct UserWithAssignment {
    pub user: UserRow,
    pub assigned_questionnaire_id: Option<String>,
}

/// Parameters for inserting a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_admin: bool,
}

// ============================================================================
// Questionnaire types
// ============================================================================

/// Questionnaire row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub meta: serde_json::Value,
    /// NULL if creator was deleted
    pub created_by: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Question row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: String,
    pub questionnaire_id: String,
    pub position: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub required: bool,
}

/// Questionnaire with its questions in presentation order
#[derive(Debug, Clone)]
pub struct QuestionnaireWithQuestions {
    pub questionnaire: QuestionnaireRow,
    pub questions: Vec<QuestionRow>,
}

/// Parameters for inserting a question
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub required: bool,
}

/// Parameters for inserting a questionnaire with its questions
#[derive(Debug, Clone)]
pub struct NewQuestionnaire {
    pub title: String,
    pub description: Option<String>,
    pub meta: serde_json::Value,
    pub created_by: Option<String>,
    pub questions: Vec<NewQuestion>,
}

// ============================================================================
// Session types
// ============================================================================

/// Session row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub questionnaire_id: String,
    pub current_index: i64,
    pub total_questions: i64,
    pub is_completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: Option<i64>,
}

/// Answer row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRow {
    pub id: String,
    pub session_id: String,
    pub question_id: String,
    pub answer_text: Option<String>,
    pub answer_json: serde_json::Value,
    pub answered_at: i64,
}

/// Parameters for recording an answer and advancing its session cursor
///
/// The cursor update only applies while the stored index still equals
/// `expected_index`.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub session_id: String,
    pub question_id: String,
    pub answer_text: Option<String>,
    pub answer_json: serde_json::Value,
    pub expected_index: i64,
    pub next_index: i64,
    pub completed: bool,
}

/// Answer joined with its question, for session detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAnswerRow {
    pub id: String,
    pub question_id: String,
    pub question_text: String,
    pub answer_text: Option<String>,
    pub answered_at: i64,
}

/// Answer joined with session and question, for the global response feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRow {
    pub id: String,
    pub user_id: String,
    pub questionnaire_id: String,
    pub question_text: String,
    pub answer_text: Option<String>,
    pub answered_at: i64,
}

// ============================================================================
// Audit types
// ============================================================================

/// Audit log row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogRow {
    pub id: i64,
    /// NULL if the actor was deleted or the action had no actor
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
    pub action: String,
    pub object_type: Option<String>,
    pub object_id: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: i64,
}

/// Parameters for appending an audit entry
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub actor_id: Option<String>,
    pub action: String,
    pub object_type: Option<String>,
    pub object_id: Option<String>,
    pub payload: serde_json::Value,
}

//! TransactionalRepository trait implementation for SQLite
//!
//! This module implements the TransactionalRepository trait for Arc<SqliteService>,
//! delegating to the free functions in `repositories`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::TransactionalRepository;
use crate::data::types::{
    AnswerRow, AuditLogRow, DashboardCounts, NewAnswer, NewAuditLog, NewQuestionnaire, NewUser,
    QuestionRow, QuestionnaireRow, QuestionnaireWithQuestions, ResponseRow, SessionAnswerRow,
    SessionRow, UserRow, UserWithAssignment,
};

use super::SqliteService;
use super::repositories::{audit, questionnaire, session, stats, user};

#[async_trait]
impl TransactionalRepository for Arc<SqliteService> {
    // ==================== User Operations ====================

    async fn create_user(&self, new: &NewUser) -> Result<UserRow, DataError> {
        user::create_user(self.pool(), new)
            .await
            .map_err(Into::into)
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRow>, DataError> {
        user::get_user(self.pool(), id).await.map_err(Into::into)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, DataError> {
        user::get_by_email(self.pool(), email)
            .await
            .map_err(Into::into)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, DataError> {
        user::username_exists(self.pool(), username)
            .await
            .map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<UserWithAssignment>, DataError> {
        user::list_users(self.pool()).await.map_err(Into::into)
    }

    async fn current_questionnaire_id(&self, user_id: &str) -> Result<Option<String>, DataError> {
        user::current_questionnaire_id(self.pool(), user_id)
            .await
            .map_err(Into::into)
    }

    async fn set_user_active(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<Option<UserRow>, DataError> {
        user::set_user_active(self.pool(), id, is_active)
            .await
            .map_err(Into::into)
    }

    // ==================== Questionnaire Operations ====================

    async fn create_questionnaire(
        &self,
        new: &NewQuestionnaire,
    ) -> Result<QuestionnaireWithQuestions, DataError> {
        questionnaire::create_questionnaire(self.pool(), new)
            .await
            .map_err(Into::into)
    }

    async fn get_questionnaire(&self, id: &str) -> Result<Option<QuestionnaireRow>, DataError> {
        questionnaire::get_questionnaire(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireWithQuestions>, DataError> {
        questionnaire::list_questionnaires(self.pool())
            .await
            .map_err(Into::into)
    }

    async fn list_questions(&self, questionnaire_id: &str) -> Result<Vec<QuestionRow>, DataError> {
        questionnaire::list_questions(self.pool(), questionnaire_id)
            .await
            .map_err(Into::into)
    }

    async fn get_question(
        &self,
        questionnaire_id: &str,
        question_id: &str,
    ) -> Result<Option<QuestionRow>, DataError> {
        questionnaire::get_question(self.pool(), questionnaire_id, question_id)
            .await
            .map_err(Into::into)
    }

    async fn count_questions(&self, questionnaire_id: &str) -> Result<i64, DataError> {
        questionnaire::count_questions(self.pool(), questionnaire_id)
            .await
            .map_err(Into::into)
    }

    async fn delete_questionnaire(&self, id: &str) -> Result<bool, DataError> {
        questionnaire::delete_questionnaire(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    // ==================== Session Operations ====================

    async fn upsert_session(
        &self,
        user_id: &str,
        questionnaire_id: &str,
        total_questions: i64,
    ) -> Result<SessionRow, DataError> {
        session::upsert_session(self.pool(), user_id, questionnaire_id, total_questions)
            .await
            .map_err(Into::into)
    }

    async fn get_user_session(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<SessionRow>, DataError> {
        session::get_user_session(self.pool(), id, user_id)
            .await
            .map_err(Into::into)
    }

    async fn get_current_session(&self, user_id: &str) -> Result<Option<SessionRow>, DataError> {
        session::get_current_session(self.pool(), user_id)
            .await
            .map_err(Into::into)
    }

    async fn override_session_progress(
        &self,
        id: &str,
        user_id: &str,
        current_index: Option<i64>,
        is_completed: Option<bool>,
    ) -> Result<Option<SessionRow>, DataError> {
        session::override_session_progress(self.pool(), id, user_id, current_index, is_completed)
            .await
            .map_err(Into::into)
    }

    async fn record_answer(&self, new: &NewAnswer) -> Result<AnswerRow, DataError> {
        session::record_answer(self.pool(), new)
            .await
            .map_err(Into::into)
    }

    async fn list_session_answers(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionAnswerRow>, DataError> {
        session::list_session_answers(self.pool(), session_id)
            .await
            .map_err(Into::into)
    }

    async fn list_responses(&self) -> Result<Vec<ResponseRow>, DataError> {
        session::list_responses(self.pool())
            .await
            .map_err(Into::into)
    }

    // ==================== Audit Operations ====================

    async fn insert_audit_log(&self, entry: &NewAuditLog) -> Result<i64, DataError> {
        audit::insert_audit_log(self.pool(), entry)
            .await
            .map_err(Into::into)
    }

    async fn list_recent_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogRow>, DataError> {
        audit::list_recent(self.pool(), limit)
            .await
            .map_err(Into::into)
    }

    // ==================== Stats Operations ====================

    async fn dashboard_counts(&self) -> Result<DashboardCounts, DataError> {
        stats::dashboard_counts(self.pool())
            .await
            .map_err(Into::into)
    }
}

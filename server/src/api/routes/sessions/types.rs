//! Session API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::routes::questionnaires::types::{QuestionDto, QuestionnaireSummaryDto};
use crate::data::types::{QuestionRow, QuestionType, SessionAnswerRow, SessionRow};
use crate::domain::{Progress, SessionDetail, SessionView, SubmittedAnswer};
use crate::utils::time::secs_to_datetime;

/// The question under the session cursor
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentQuestionDto {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub required: bool,
}

impl From<&QuestionRow> for CurrentQuestionDto {
    fn from(row: &QuestionRow) -> Self {
        Self {
            id: row.id.clone(),
            text: row.question_text.clone(),
            question_type: row.question_type,
            options: row.options.clone(),
            required: row.required,
        }
    }
}

/// Caller's in-progress session, as returned by `/users/me/session`
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionViewDto {
    pub id: String,
    pub questionnaire_id: String,
    pub questionnaire: QuestionnaireSummaryDto,
    pub current_question_index: i64,
    pub total_questions: i64,
    pub is_completed: bool,
    pub current_question: Option<CurrentQuestionDto>,
    pub questions: Vec<QuestionDto>,
    pub progress: f64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<SessionView> for SessionViewDto {
    fn from(view: SessionView) -> Self {
        let progress = view.progress().percent();
        let current_question = view.current_question().map(CurrentQuestionDto::from);
        let SessionView {
            session,
            questionnaire,
            questions,
        } = view;
        Self {
            id: session.id,
            questionnaire_id: session.questionnaire_id,
            questionnaire: questionnaire.into(),
            current_question_index: session.current_index,
            total_questions: session.total_questions,
            is_completed: session.is_completed,
            current_question,
            questions: questions.into_iter().map(QuestionDto::from).collect(),
            progress,
            expires_at: session.expires_at.map(secs_to_datetime),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionAnswerDto {
    pub id: String,
    pub question_id: String,
    pub question_text: String,
    pub answer: Option<String>,
    pub answered_at: DateTime<Utc>,
}

impl From<SessionAnswerRow> for SessionAnswerDto {
    fn from(row: SessionAnswerRow) -> Self {
        Self {
            id: row.id,
            question_id: row.question_id,
            question_text: row.question_text,
            answer: row.answer_text,
            answered_at: secs_to_datetime(row.answered_at),
        }
    }
}

/// Session with the answers submitted so far
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDetailDto {
    pub id: String,
    pub questionnaire: QuestionnaireSummaryDto,
    pub current_question_index: i64,
    pub total_questions: i64,
    pub is_completed: bool,
    pub answers: Vec<SessionAnswerDto>,
    pub progress: f64,
}

impl From<SessionDetail> for SessionDetailDto {
    fn from(detail: SessionDetail) -> Self {
        let progress = detail.progress().percent();
        let SessionDetail {
            session,
            questionnaire,
            answers,
        } = detail;
        Self {
            id: session.id,
            questionnaire: questionnaire.into(),
            current_question_index: session.current_index,
            total_questions: session.total_questions,
            is_completed: session.is_completed,
            answers: answers.into_iter().map(SessionAnswerDto::from).collect(),
            progress,
        }
    }
}

/// Cursor state after a direct override
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionProgressDto {
    pub id: String,
    pub current_question_index: i64,
    pub is_completed: bool,
    pub progress: f64,
}

impl From<SessionRow> for SessionProgressDto {
    fn from(session: SessionRow) -> Self {
        Self {
            progress: Progress::of(&session).percent(),
            id: session.id,
            current_question_index: session.current_index,
            is_completed: session.is_completed,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSessionRequest {
    #[validate(range(min = 0, message = "current_question_index must be >= 0"))]
    pub current_question_index: Option<i64>,
    pub is_completed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitAnswerRequest {
    pub question_id: Option<String>,
    pub answer_text: Option<String>,
    /// Structured answer (selected options, rating, ...)
    #[schema(value_type = Option<Object>)]
    pub answer_json: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmittedAnswerDto {
    pub id: String,
    pub question_id: String,
    pub answer: Option<String>,
    pub session_progress: i64,
    pub is_completed: bool,
}

impl From<SubmittedAnswer> for SubmittedAnswerDto {
    fn from(submitted: SubmittedAnswer) -> Self {
        Self {
            id: submitted.answer.id,
            question_id: submitted.answer.question_id,
            answer: submitted.answer.answer_text,
            session_progress: submitted.progress.current_index,
            is_completed: submitted.progress.is_completed,
        }
    }
}

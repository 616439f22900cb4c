//! Questionnaire API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::data::types::{
    NewQuestion, QuestionRow, QuestionType, QuestionnaireRow, QuestionnaireWithQuestions,
};
use crate::utils::time::secs_to_datetime;

/// Question as presented to clients
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionDto {
    pub id: String,
    pub text: String,
    pub order: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub required: bool,
    pub options: Vec<String>,
}

impl From<QuestionRow> for QuestionDto {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            text: row.question_text,
            order: row.position,
            question_type: row.question_type,
            required: row.required,
            options: row.options,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionnaireDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub meta: serde_json::Value,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub questions: Vec<QuestionDto>,
}

impl From<QuestionnaireWithQuestions> for QuestionnaireDto {
    fn from(q: QuestionnaireWithQuestions) -> Self {
        let QuestionnaireWithQuestions {
            questionnaire,
            questions,
        } = q;
        Self {
            id: questionnaire.id,
            title: questionnaire.title,
            description: questionnaire.description,
            meta: questionnaire.meta,
            created_by: questionnaire.created_by,
            created_at: secs_to_datetime(questionnaire.created_at),
            is_active: questionnaire.is_active,
            questions: questions.into_iter().map(QuestionDto::from).collect(),
        }
    }
}

/// Questionnaire header embedded in session responses
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionnaireSummaryDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

impl From<QuestionnaireRow> for QuestionnaireSummaryDto {
    fn from(row: QuestionnaireRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    pub text: String,
    /// Unknown types are stored as `text`
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub required: Option<bool>,
}

impl From<CreateQuestionRequest> for NewQuestion {
    fn from(req: CreateQuestionRequest) -> Self {
        Self {
            text: req.text,
            question_type: req
                .question_type
                .as_deref()
                .map(QuestionType::parse)
                .unwrap_or_default(),
            options: req.options,
            required: req.required.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateQuestionnaireRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<serde_json::Value>,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

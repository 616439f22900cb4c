//! Questionnaire catalog endpoints

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::auth::Auth;
use crate::api::extractors::{IdPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::data::TransactionalService;
use crate::data::types::{NewQuestion, NewQuestionnaire};
use crate::domain::{AuditAction, AuditEntry, AuditObject, audit};

use types::{CreateQuestionnaireRequest, MessageResponse, QuestionnaireDto};

/// Shared state for questionnaire endpoints
#[derive(Clone)]
pub struct QuestionnairesApiState {
    pub database: Arc<TransactionalService>,
}

/// Build questionnaire routes
pub fn routes(database: Arc<TransactionalService>) -> Router<()> {
    let state = QuestionnairesApiState { database };

    Router::new()
        .route("/", get(list_questionnaires).post(create_questionnaire))
        .route("/{id}", delete(delete_questionnaire))
        .with_state(state)
}

/// List all questionnaires, newest first
#[utoipa::path(
    get,
    path = "/api/v1/questionnaires",
    tag = "questionnaires",
    responses(
        (status = 200, description = "Questionnaires with ordered questions", body = Vec<QuestionnaireDto>)
    )
)]
pub async fn list_questionnaires(
    State(state): State<QuestionnairesApiState>,
    _auth: Auth,
) -> Result<Json<Vec<QuestionnaireDto>>, ApiError> {
    let questionnaires = state.database.repository().list_questionnaires().await?;
    Ok(Json(
        questionnaires
            .into_iter()
            .map(QuestionnaireDto::from)
            .collect(),
    ))
}

/// Create a questionnaire with its questions
#[utoipa::path(
    post,
    path = "/api/v1/questionnaires",
    tag = "questionnaires",
    request_body = CreateQuestionnaireRequest,
    responses(
        (status = 201, description = "Questionnaire created", body = QuestionnaireDto),
        (status = 400, description = "Missing title or questions")
    )
)]
pub async fn create_questionnaire(
    State(state): State<QuestionnairesApiState>,
    auth: Auth,
    ValidatedJson(body): ValidatedJson<CreateQuestionnaireRequest>,
) -> Result<(StatusCode, Json<QuestionnaireDto>), ApiError> {
    let title = match body.title {
        Some(title) if !title.trim().is_empty() && !body.questions.is_empty() => title,
        _ => {
            return Err(ApiError::bad_request(
                "MISSING_FIELDS",
                "Title and questions are required",
            ));
        }
    };

    let meta = body.meta.unwrap_or_else(|| serde_json::json!({}));
    if !meta.is_object() {
        return Err(ApiError::bad_request(
            "INVALID_META",
            "meta must be a JSON object",
        ));
    }

    let questions: Vec<NewQuestion> = body.questions.into_iter().map(NewQuestion::from).collect();
    if let Some(q) = questions
        .iter()
        .find(|q| q.question_type.requires_options() && q.options.is_empty())
    {
        return Err(ApiError::bad_request(
            "MISSING_OPTIONS",
            format!("Question \"{}\" of type {} needs options", q.text, q.question_type),
        ));
    }

    let repo = state.database.repository();
    let created = repo
        .create_questionnaire(&NewQuestionnaire {
            title: title.clone(),
            description: body.description,
            meta,
            created_by: Some(auth.user_id().to_string()),
            questions,
        })
        .await?;

    audit::record(
        repo.as_ref(),
        AuditEntry::new(AuditAction::QuestionnaireCreated)
            .actor(auth.user_id())
            .object(AuditObject::Questionnaire, &created.questionnaire.id)
            .payload(serde_json::json!({
                "title": title,
                "questions_count": created.questions.len(),
            })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(QuestionnaireDto::from(created))))
}

/// Delete a questionnaire with its questions, sessions and answers
#[utoipa::path(
    delete,
    path = "/api/v1/questionnaires/{id}",
    tag = "questionnaires",
    params(("id" = String, Path, description = "Questionnaire ID")),
    responses(
        (status = 200, description = "Questionnaire deleted", body = MessageResponse),
        (status = 404, description = "Questionnaire not found")
    )
)]
pub async fn delete_questionnaire(
    State(state): State<QuestionnairesApiState>,
    auth: Auth,
    path: IdPath,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = state.database.repository();
    let not_found = || ApiError::not_found("QUESTIONNAIRE_NOT_FOUND", "Questionnaire not found");

    let questionnaire = repo
        .get_questionnaire(&path.id)
        .await?
        .ok_or_else(not_found)?;
    if !repo.delete_questionnaire(&path.id).await? {
        return Err(not_found());
    }

    audit::record(
        repo.as_ref(),
        AuditEntry::new(AuditAction::QuestionnaireDeleted)
            .actor(auth.user_id())
            .object(AuditObject::Questionnaire, &path.id)
            .payload(serde_json::json!({ "title": questionnaire.title })),
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Questionnaire deleted successfully".to_string(),
    }))
}

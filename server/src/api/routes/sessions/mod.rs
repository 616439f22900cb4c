//! Session endpoints: detail, progress override, answer submission
//!
//! Every route is scoped to sessions owned by the caller; other users'
//! sessions answer 404.

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::Auth;
use crate::api::extractors::{IdPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::data::TransactionalService;
use crate::domain::{AuditAction, AuditEntry, AuditObject, audit, sessions};

use types::{
    SessionDetailDto, SessionProgressDto, SubmitAnswerRequest, SubmittedAnswerDto,
    UpdateSessionRequest,
};

/// Shared state for session endpoints
#[derive(Clone)]
pub struct SessionsApiState {
    pub database: Arc<TransactionalService>,
}

/// Build session routes
pub fn routes(database: Arc<TransactionalService>) -> Router<()> {
    let state = SessionsApiState { database };

    Router::new()
        .route("/{id}", get(get_session).patch(update_session))
        .route("/{id}/answers", post(submit_answer))
        .with_state(state)
}

/// Get a session with its answers
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session with answers", body = SessionDetailDto),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<SessionsApiState>,
    auth: Auth,
    path: IdPath,
) -> Result<Json<SessionDetailDto>, ApiError> {
    let repo = state.database.repository();
    let detail = sessions::session_detail(repo.as_ref(), auth.user_id(), &path.id).await?;
    Ok(Json(detail.into()))
}

/// Overwrite the session cursor and/or completion flag
#[utoipa::path(
    patch,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session ID")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = SessionProgressDto),
        (status = 404, description = "Session not found")
    )
)]
pub async fn update_session(
    State(state): State<SessionsApiState>,
    auth: Auth,
    path: IdPath,
    ValidatedJson(body): ValidatedJson<UpdateSessionRequest>,
) -> Result<Json<SessionProgressDto>, ApiError> {
    let repo = state.database.repository();
    let session = sessions::override_progress(
        repo.as_ref(),
        auth.user_id(),
        &path.id,
        body.current_question_index,
        body.is_completed,
    )
    .await?;

    if body.current_question_index.is_some() || body.is_completed.is_some() {
        audit::record(
            repo.as_ref(),
            AuditEntry::new(AuditAction::SessionProgressUpdated)
                .actor(auth.user_id())
                .object(AuditObject::Session, &session.id)
                .payload(serde_json::json!({
                    "current_question_index": body.current_question_index,
                    "is_completed": body.is_completed,
                })),
        )
        .await;
    }

    Ok(Json(session.into()))
}

/// Submit an answer and advance the session
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/answers",
    tag = "sessions",
    params(("id" = String, Path, description = "Session ID")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 201, description = "Answer recorded", body = SubmittedAnswerDto),
        (status = 400, description = "question_id or answer_text missing"),
        (status = 404, description = "Session or question not found"),
        (status = 409, description = "Session advanced concurrently")
    )
)]
pub async fn submit_answer(
    State(state): State<SessionsApiState>,
    auth: Auth,
    path: IdPath,
    ValidatedJson(body): ValidatedJson<SubmitAnswerRequest>,
) -> Result<(StatusCode, Json<SubmittedAnswerDto>), ApiError> {
    let (Some(question_id), Some(answer_text)) =
        (body.question_id.filter(|s| !s.is_empty()), body.answer_text)
    else {
        return Err(ApiError::bad_request(
            "MISSING_FIELDS",
            "question_id and answer_text are required",
        ));
    };

    let repo = state.database.repository();
    let submitted = sessions::submit_answer(
        repo.as_ref(),
        auth.user_id(),
        &path.id,
        &question_id,
        answer_text,
        body.answer_json,
    )
    .await?;

    audit::record(
        repo.as_ref(),
        AuditEntry::new(AuditAction::AnswerSubmitted)
            .actor(auth.user_id())
            .object(AuditObject::Answer, &submitted.answer.id)
            .payload(serde_json::json!({
                "question_id": question_id,
                "session_id": path.id,
            })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(submitted.into())))
}

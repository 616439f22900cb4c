//! Answer log listing

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::auth::Auth;
use crate::api::types::ApiError;
use crate::data::TransactionalService;
use crate::data::types::ResponseRow;
use crate::utils::time::secs_to_datetime;

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseDto {
    pub id: String,
    pub user_id: String,
    pub questionnaire_id: String,
    pub question_text: String,
    pub response: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<ResponseRow> for ResponseDto {
    fn from(row: ResponseRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            questionnaire_id: row.questionnaire_id,
            question_text: row.question_text,
            response: row.answer_text,
            timestamp: secs_to_datetime(row.answered_at),
        }
    }
}

#[derive(Clone)]
pub struct ResponsesApiState {
    pub database: Arc<TransactionalService>,
}

pub fn routes(database: Arc<TransactionalService>) -> Router<()> {
    Router::new()
        .route("/", get(list_responses))
        .with_state(ResponsesApiState { database })
}

/// All submitted answers, newest first
#[utoipa::path(
    get,
    path = "/api/v1/responses",
    tag = "responses",
    responses(
        (status = 200, description = "Answer log", body = Vec<ResponseDto>)
    )
)]
pub async fn list_responses(
    State(state): State<ResponsesApiState>,
    _auth: Auth,
) -> Result<Json<Vec<ResponseDto>>, ApiError> {
    let rows = state.database.repository().list_responses().await?;
    Ok(Json(rows.into_iter().map(ResponseDto::from).collect()))
}

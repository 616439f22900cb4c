//! Dashboard statistics and activity feed

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::auth::Auth;
use crate::api::extractors::ValidatedQuery;
use crate::api::types::ApiError;
use crate::core::constants::{DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT};
use crate::data::TransactionalService;
use crate::data::types::DashboardCounts;
use crate::domain::{ActivityItem, audit};
use crate::utils::time::secs_to_datetime;

/// Raw table counts, computed on every request
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsDto {
    pub total_users: i64,
    pub active_users: i64,
    pub total_questionnaires: i64,
    pub active_questionnaires: i64,
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub total_questions: i64,
    pub total_answers: i64,
    pub total_audit_logs: i64,
}

impl From<DashboardCounts> for DashboardStatsDto {
    fn from(c: DashboardCounts) -> Self {
        Self {
            total_users: c.total_users,
            active_users: c.active_users,
            total_questionnaires: c.total_questionnaires,
            active_questionnaires: c.active_questionnaires,
            total_sessions: c.total_sessions,
            completed_sessions: c.completed_sessions,
            total_questions: c.total_questions,
            total_answers: c.total_answers,
            total_audit_logs: c.total_audit_logs,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ActivityItem> for ActivityDto {
    fn from(item: ActivityItem) -> Self {
        Self {
            id: item.id.to_string(),
            kind: item.kind,
            title: item.title,
            description: item.description,
            timestamp: secs_to_datetime(item.timestamp),
        }
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Number of entries (default 10, max 100)
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct DashboardApiState {
    pub database: Arc<TransactionalService>,
}

pub fn routes(database: Arc<TransactionalService>) -> Router<()> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/activity", get(get_activity))
        .with_state(DashboardApiState { database })
}

/// Aggregate counts across all tables
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Table counts", body = DashboardStatsDto)
    )
)]
pub async fn get_stats(
    State(state): State<DashboardApiState>,
    _auth: Auth,
) -> Result<Json<DashboardStatsDto>, ApiError> {
    let counts = state.database.repository().dashboard_counts().await?;
    Ok(Json(counts.into()))
}

/// Most recent audit entries as activity items
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/activity",
    tag = "dashboard",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Recent activity, newest first", body = Vec<ActivityDto>),
        (status = 400, description = "limit out of range")
    )
)]
pub async fn get_activity(
    State(state): State<DashboardApiState>,
    _auth: Auth,
    ValidatedQuery(query): ValidatedQuery<ActivityQuery>,
) -> Result<Json<Vec<ActivityDto>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .min(MAX_ACTIVITY_LIMIT);
    let repo = state.database.repository();
    let items = audit::recent_activity(repo.as_ref(), limit).await?;
    Ok(Json(items.into_iter().map(ActivityDto::from).collect()))
}

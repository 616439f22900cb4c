//! Authentication API endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::Extensions;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::auth::AuthManager;
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::data::TransactionalService;
use crate::domain::{AuditAction, AuditEntry, AuditObject, audit, users};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile returned with a successful login
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginUserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: String,
    /// Current in-progress questionnaire, stakeholders only
    #[serde(rename = "assignedQuestionnaireId")]
    pub assigned_questionnaire_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub refresh: String,
    pub user: LoginUserDto,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub token: String,
}

/// Auth state with database access
#[derive(Clone)]
pub struct AuthRoutesState {
    pub auth_manager: Arc<AuthManager>,
    pub database: Arc<TransactionalService>,
}

/// Create auth routes (mounted at `/api/v1`)
pub fn routes(auth_manager: Arc<AuthManager>, database: Arc<TransactionalService>) -> Router {
    let state = AuthRoutesState {
        auth_manager,
        database,
    };

    Router::new()
        .route("/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .with_state(state)
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("INVALID_CREDENTIALS", "Invalid credentials")
}

/// Exchange email and password for a token pair
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthRoutesState>,
    extensions: Extensions,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        body.email.filter(|s| !s.is_empty()),
        body.password.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "MISSING_FIELDS",
            "Email and password are required",
        ));
    };

    let repo = state.database.repository();
    let user = users::verify_credentials(repo.as_ref(), &email, &password)
        .await?
        .ok_or_else(invalid_credentials)?;

    let tokens = state.auth_manager.issue(&user.id).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign tokens");
        ApiError::bad_request("TOKEN_ERROR", e.to_string())
    })?;

    let role = user.role();
    let assigned_questionnaire_id = if role.is_admin() {
        None
    } else {
        repo.current_questionnaire_id(&user.id).await?
    };

    let ip_address = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    audit::record(
        repo.as_ref(),
        AuditEntry::new(AuditAction::UserLogin)
            .actor(&user.id)
            .object(AuditObject::User, &user.id)
            .payload(serde_json::json!({ "ip_address": ip_address })),
    )
    .await;

    tracing::debug!(user_id = %user.id, %role, "User logged in");

    Ok(Json(LoginResponse {
        token: tokens.access,
        refresh: tokens.refresh,
        user: LoginUserDto {
            name: user.display_name(),
            id: user.id,
            username: user.username,
            email: user.email,
            role: role.to_string(),
            assigned_questionnaire_id,
            is_active: user.is_active,
        },
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid, expired or non-refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AuthRoutesState>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let (claims, token) = state
        .auth_manager
        .refresh(&body.refresh)
        .map_err(|e| ApiError::unauthorized("TOKEN_INVALID", e.to_string()))?;

    let user = state
        .database
        .repository()
        .get_user(claims.user_id())
        .await?;
    if !user.is_some_and(|u| u.is_active) {
        return Err(ApiError::unauthorized(
            "USER_INACTIVE",
            "User not found or inactive",
        ));
    }

    Ok(Json(RefreshResponse { token }))
}

//! User management and self-service endpoints

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::auth::Auth;
use crate::api::extractors::{IdPath, ValidatedJson};
use crate::api::routes::questionnaires::types::MessageResponse;
use crate::api::routes::sessions::types::SessionViewDto;
use crate::api::types::ApiError;
use crate::data::TransactionalService;
use crate::data::types::{UserRole, UserWithAssignment};
use crate::domain::{AuditAction, AuditEntry, AuditObject, CreateUser, audit, sessions, users};

use types::{
    AssignRequest, AssignResponse, CreateUserRequest, CreatedUserDto, UpdateUserRequest, UserDto,
    UserStatusDto,
};

/// Shared state for user endpoints
#[derive(Clone)]
pub struct UsersApiState {
    pub database: Arc<TransactionalService>,
    /// Password given to accounts created without one
    pub default_password: Arc<str>,
}

/// Build user routes
pub fn routes(database: Arc<TransactionalService>, default_password: &str) -> Router<()> {
    let state = UsersApiState {
        database,
        default_password: Arc::from(default_password),
    };

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_current_user))
        .route("/me/session", get(get_current_session))
        .route("/{id}", patch(update_user))
        .route("/{id}/assign", post(assign_questionnaire))
        .route("/{id}/remind", post(send_reminder))
        .with_state(state)
}

fn user_not_found() -> ApiError {
    ApiError::not_found("USER_NOT_FOUND", "User not found")
}

/// List all users, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Users with their current questionnaire", body = Vec<UserDto>)
    )
)]
pub async fn list_users(
    State(state): State<UsersApiState>,
    _auth: Auth,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.database.repository().list_users().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// Create an account with a username derived from the email
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreatedUserDto),
        (status = 400, description = "Name or email missing"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<UsersApiState>,
    auth: Auth,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUserDto>), ApiError> {
    let (Some(name), Some(email)) = (
        body.name.filter(|s| !s.trim().is_empty()),
        body.email.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "MISSING_FIELDS",
            "Name and email are required",
        ));
    };
    let role = body
        .role
        .as_deref()
        .map(UserRole::parse)
        .unwrap_or_default();
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| state.default_password.to_string());

    let repo = state.database.repository();
    let user = users::create_user(
        repo.as_ref(),
        CreateUser {
            name,
            email: email.clone(),
            password,
            role,
        },
    )
    .await?;

    audit::record(
        repo.as_ref(),
        AuditEntry::new(AuditAction::UserCreated)
            .actor(auth.user_id())
            .object(AuditObject::User, &user.id)
            .payload(serde_json::json!({ "email": email, "role": role.as_str() })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Toggle a user's active flag
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserStatusDto),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<UsersApiState>,
    auth: Auth,
    path: IdPath,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserStatusDto>, ApiError> {
    let repo = state.database.repository();

    let user = match body.is_active {
        Some(is_active) => {
            let user = repo
                .set_user_active(&path.id, is_active)
                .await?
                .ok_or_else(user_not_found)?;
            audit::record(
                repo.as_ref(),
                AuditEntry::new(AuditAction::UserStatusChanged)
                    .actor(auth.user_id())
                    .object(AuditObject::User, &path.id)
                    .payload(serde_json::json!({ "is_active": is_active })),
            )
            .await;
            user
        }
        None => repo.get_user(&path.id).await?.ok_or_else(user_not_found)?,
    };

    Ok(Json(user.into()))
}

/// Assign (or reassign) a questionnaire to a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/assign",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Questionnaire assigned", body = AssignResponse),
        (status = 400, description = "questionnaire_id missing"),
        (status = 404, description = "User or questionnaire not found")
    )
)]
pub async fn assign_questionnaire(
    State(state): State<UsersApiState>,
    auth: Auth,
    path: IdPath,
    ValidatedJson(body): ValidatedJson<AssignRequest>,
) -> Result<Json<AssignResponse>, ApiError> {
    let Some(questionnaire_id) = body.questionnaire_id.filter(|s| !s.is_empty()) else {
        return Err(ApiError::bad_request(
            "MISSING_FIELDS",
            "questionnaire_id is required",
        ));
    };

    let repo = state.database.repository();
    let assignment =
        sessions::assign_questionnaire(repo.as_ref(), &path.id, &questionnaire_id).await?;

    audit::record(
        repo.as_ref(),
        AuditEntry::new(AuditAction::QuestionnaireAssigned)
            .actor(auth.user_id())
            .object(AuditObject::User, &path.id)
            .payload(serde_json::json!({
                "questionnaire_id": questionnaire_id,
                "session_id": assignment.session.id,
            })),
    )
    .await;

    Ok(Json(AssignResponse {
        message: format!(
            "Questionnaire \"{}\" assigned to {}",
            assignment.questionnaire.title,
            assignment.user.display_name()
        ),
        session_id: assignment.session.id,
        questionnaire_id,
        user_id: path.id,
    }))
}

/// Record a reminder for a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/remind",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Reminder recorded", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn send_reminder(
    State(state): State<UsersApiState>,
    auth: Auth,
    path: IdPath,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = state.database.repository();
    let user = repo.get_user(&path.id).await?.ok_or_else(user_not_found)?;

    audit::record(
        repo.as_ref(),
        AuditEntry::new(AuditAction::ReminderSent)
            .actor(auth.user_id())
            .object(AuditObject::User, &user.id)
            .payload(serde_json::json!({ "email": user.email })),
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Reminder sent successfully".to_string(),
    }))
}

/// Caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Caller profile", body = UserDto)
    )
)]
pub async fn get_current_user(
    State(state): State<UsersApiState>,
    auth: Auth,
) -> Result<Json<UserDto>, ApiError> {
    let user = auth.ctx.user;
    let assigned_questionnaire_id = state
        .database
        .repository()
        .current_questionnaire_id(&user.id)
        .await?;
    Ok(Json(
        UserWithAssignment {
            user,
            assigned_questionnaire_id,
        }
        .into(),
    ))
}

/// Caller's current in-progress session
#[utoipa::path(
    get,
    path = "/api/v1/users/me/session",
    tag = "users",
    responses(
        (status = 200, description = "Current session with questions", body = SessionViewDto),
        (status = 404, description = "No incomplete session")
    )
)]
pub async fn get_current_session(
    State(state): State<UsersApiState>,
    auth: Auth,
) -> Result<Json<SessionViewDto>, ApiError> {
    let repo = state.database.repository();
    let view = sessions::current_session(repo.as_ref(), auth.user_id()).await?;
    Ok(Json(view.into()))
}

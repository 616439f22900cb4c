//! User API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::data::types::{UserRow, UserWithAssignment};
use crate::utils::time::secs_to_datetime;

/// User as listed to administrators and returned by `/users/me`
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub assigned_questionnaire_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserWithAssignment> for UserDto {
    fn from(row: UserWithAssignment) -> Self {
        let UserWithAssignment {
            user,
            assigned_questionnaire_id,
        } = row;
        Self {
            name: user.display_name(),
            role: user.role().to_string(),
            created_at: secs_to_datetime(user.created_at),
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            assigned_questionnaire_id,
        }
    }
}

/// Newly created account
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for CreatedUserDto {
    fn from(user: UserRow) -> Self {
        Self {
            name: user.display_name(),
            role: user.role().to_string(),
            created_at: secs_to_datetime(user.created_at),
            id: user.id,
            email: user.email,
            is_active: user.is_active,
        }
    }
}

/// Account after an activation change
#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatusDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
}

impl From<UserRow> for UserStatusDto {
    fn from(user: UserRow) -> Self {
        Self {
            name: user.display_name(),
            id: user.id,
            email: user.email,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(max = 150, message = "Name must be at most 150 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// `admin` or `stakeholder` (default)
    pub role: Option<String>,
    /// Falls back to the configured default password
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignRequest {
    pub questionnaire_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignResponse {
    pub message: String,
    pub session_id: String,
    pub questionnaire_id: String,
    pub user_id: String,
}

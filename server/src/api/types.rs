//! Shared API types
//!
//! Error handling and conversions from the data and domain layers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::DataError;
use crate::domain::{SessionError, UserError};

/// Standard API error response
///
/// Serialized as `{"error": <message>, "code": <CODE>}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    Unauthorized { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Conflicts keep their status; everything else surfaces as 400 with the message
    pub fn from_data(e: DataError) -> Self {
        match e {
            DataError::Conflict(message) => Self::conflict("CONFLICT", message),
            other => {
                tracing::error!(error = %other, "Data error");
                Self::bad_request("DATABASE_ERROR", other.to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
        }
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        Self::from_data(e)
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(message) => Self::not_found("NOT_FOUND", message),
            SessionError::Data(e) => Self::from_data(e),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Data(e) => Self::from_data(e),
            UserError::Password(e) => {
                tracing::error!(error = %e, "Password hashing failed");
                Self::bad_request("PASSWORD_ERROR", e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            Self::BadRequest { code, message }
            | Self::Unauthorized { code, message }
            | Self::NotFound { code, message }
            | Self::Conflict { code, message } => (code, message),
        };
        (
            status,
            Json(serde_json::json!({
                "error": message,
                "code": code,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) =
            body_json(ApiError::bad_request("MISSING_FIELDS", "Email and password are required"))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email and password are required");
        assert_eq!(body["code"], "MISSING_FIELDS");
    }

    #[tokio::test]
    async fn test_conflict_keeps_status() {
        let (status, body) =
            body_json(ApiError::from_data(DataError::Conflict("taken".into()))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "taken");
    }

    #[tokio::test]
    async fn test_other_data_errors_are_bad_request() {
        let err = DataError::Sqlite(sqlx::Error::RowNotFound);
        let (status, body) = body_json(ApiError::from_data(err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_session_not_found_maps_to_404() {
        let (status, body) = body_json(SessionError::NotFound("Session not found").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
    }
}

//! Authentication middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::context::AuthContext;
use super::jwt::JwtError;
use super::manager::AuthManager;
use crate::data::TransactionalService;

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: &'static str,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "AUTH_REQUIRED",
            message: "Authentication required",
        }
    }

    pub fn expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "TOKEN_EXPIRED",
            message: "Token has expired",
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "TOKEN_INVALID",
            message: "Invalid token",
        }
    }

    pub fn inactive() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "USER_INACTIVE",
            message: "User not found or inactive",
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "DATABASE_ERROR",
            message: "Could not verify user",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => Self::expired(),
            _ => Self::invalid(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message,
            "code": self.code,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub auth_manager: Arc<AuthManager>,
    pub database: Arc<TransactionalService>,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware
///
/// Validates the bearer access token, then checks the user still exists
/// and is active. Injects `AuthContext` into request extensions.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&request).ok_or_else(AuthError::required)?;
    let claims = state.auth_manager.validate_access(token)?;

    let user = state
        .database
        .repository()
        .get_user(claims.user_id())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load token user");
            AuthError::unavailable()
        })?
        .filter(|u| u.is_active)
        .ok_or_else(AuthError::inactive)?;

    request.extensions_mut().insert(AuthContext { user });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&request_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&request_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&request_with("Basic abc")), None);
        assert_eq!(bearer_token(&request_with("Bearer ")), None);
        assert_eq!(
            bearer_token(&Request::builder().body(Body::empty()).unwrap()),
            None
        );
    }

    #[test]
    fn test_jwt_errors_map_to_codes() {
        assert_eq!(AuthError::from(JwtError::Expired).code, "TOKEN_EXPIRED");
        assert_eq!(
            AuthError::from(JwtError::InvalidSignature).code,
            "TOKEN_INVALID"
        );
    }
}

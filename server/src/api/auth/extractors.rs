//! Auth extractor for Axum handlers
//!
//! ```no_run
//! # use canvass_server::api::auth::Auth;
//! # use canvass_server::api::types::ApiError;
//! pub async fn whoami(auth: Auth) -> Result<String, ApiError> {
//!     Ok(auth.user_id().to_string())
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use super::context::AuthContext;
use crate::api::types::ApiError;

/// Rejection when the auth context is missing from the request
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        ApiError::unauthorized("AUTH_REQUIRED", "Authentication required").into_response()
    }
}

/// The authenticated caller
///
/// Only resolves behind the `require_auth` middleware.
pub struct Auth {
    pub ctx: AuthContext,
}

impl Auth {
    pub fn user_id(&self) -> &str {
        self.ctx.user_id()
    }
}

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthRejection)?;
        Ok(Self { ctx })
    }
}

//! Authenticated request context

use crate::data::types::UserRow;

/// The authenticated caller, injected by `require_auth`
///
/// Carries the user row as loaded while checking the token, so handlers do
/// not need a second lookup for the caller's profile.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: UserRow,
}

impl AuthContext {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

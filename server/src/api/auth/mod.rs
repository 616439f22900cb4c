//! Authentication module

mod context;
mod extractors;
pub mod jwt;
mod manager;
pub mod middleware;

pub use context::AuthContext;
pub use extractors::{Auth, AuthRejection};
pub use jwt::{JwtError, TokenClaims, TokenType};
pub use manager::{AuthManager, TokenPair};
pub use middleware::{AuthError, AuthState, require_auth};

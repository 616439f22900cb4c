//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::auth::{AuthManager, AuthState, require_auth};
use super::middleware::{self, AllowedOrigins};
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::{auth, dashboard, health, questionnaires, responses, sessions, users};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::TransactionalService;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Serve until the shutdown signal fires; returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let host = app.config.server.host.clone();
        let port = app.config.server.port;

        let router = build_router(
            app.database.clone(),
            app.auth.clone(),
            &allowed_origins,
            &app.config.auth.default_password,
        );

        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", host, port))?;
        tracing::debug!(addr = %listener.local_addr()?, "HTTP server listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// Assemble the full HTTP router
///
/// Login, refresh, health and the OpenAPI routes are public; every other
/// `/api/v1` route sits behind `require_auth`.
pub fn build_router(
    database: Arc<TransactionalService>,
    auth_manager: Arc<AuthManager>,
    allowed_origins: &AllowedOrigins,
    default_password: &str,
) -> Router {
    let auth_state = AuthState {
        auth_manager: auth_manager.clone(),
        database: database.clone(),
    };
    let protected = |routes: Router| {
        routes.layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            require_auth,
        ))
    };

    Router::new()
        .route("/api/v1/health", get(health::health))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .nest("/api/v1", auth::routes(auth_manager, database.clone()))
        .nest(
            "/api/v1/questionnaires",
            protected(questionnaires::routes(database.clone())),
        )
        .nest(
            "/api/v1/users",
            protected(users::routes(database.clone(), default_password)),
        )
        .nest(
            "/api/v1/sessions",
            protected(sessions::routes(database.clone())),
        )
        .nest(
            "/api/v1/responses",
            protected(responses::routes(database.clone())),
        )
        .nest("/api/v1/dashboard", protected(dashboard::routes(database)))
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}

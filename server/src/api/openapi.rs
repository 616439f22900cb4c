//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::routes::{auth, dashboard, health, questionnaires, responses, sessions, users};
use crate::data::types::QuestionType;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Canvass API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Questionnaire assignment and response collection"
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Login and token refresh"),
        (name = "questionnaires", description = "Questionnaire catalog"),
        (name = "users", description = "User management and assignment"),
        (name = "sessions", description = "Answering sessions"),
        (name = "responses", description = "Answer log"),
        (name = "dashboard", description = "Statistics and activity feed")
    ),
    paths(
        health::health,
        auth::login,
        auth::refresh_token,
        questionnaires::list_questionnaires,
        questionnaires::create_questionnaire,
        questionnaires::delete_questionnaire,
        users::list_users,
        users::create_user,
        users::update_user,
        users::assign_questionnaire,
        users::send_reminder,
        users::get_current_user,
        users::get_current_session,
        sessions::get_session,
        sessions::update_session,
        sessions::submit_answer,
        responses::list_responses,
        dashboard::get_stats,
        dashboard::get_activity,
    ),
    components(schemas(
        QuestionType,
        health::HealthResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::LoginUserDto,
        auth::RefreshRequest,
        auth::RefreshResponse,
        questionnaires::types::QuestionDto,
        questionnaires::types::QuestionnaireDto,
        questionnaires::types::QuestionnaireSummaryDto,
        questionnaires::types::CreateQuestionRequest,
        questionnaires::types::CreateQuestionnaireRequest,
        questionnaires::types::MessageResponse,
        users::types::UserDto,
        users::types::CreatedUserDto,
        users::types::UserStatusDto,
        users::types::CreateUserRequest,
        users::types::UpdateUserRequest,
        users::types::AssignRequest,
        users::types::AssignResponse,
        sessions::types::CurrentQuestionDto,
        sessions::types::SessionViewDto,
        sessions::types::SessionAnswerDto,
        sessions::types::SessionDetailDto,
        sessions::types::SessionProgressDto,
        sessions::types::UpdateSessionRequest,
        sessions::types::SubmitAnswerRequest,
        sessions::types::SubmittedAnswerDto,
        responses::ResponseDto,
        dashboard::DashboardStatsDto,
        dashboard::ActivityDto,
    )),
    modifiers(&BearerAuth),
    security(("bearer" = []))
)]
pub struct ApiDoc;

/// Registers the bearer token scheme used by every protected route
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Canvass API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true,
                showExtensions: true,
                showCommonExtensions: true
            });
        };
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/login",
            "/api/v1/auth/refresh",
            "/api/v1/questionnaires/{id}",
            "/api/v1/users/{id}/assign",
            "/api/v1/users/me/session",
            "/api/v1/sessions/{id}/answers",
            "/api/v1/dashboard/activity",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}

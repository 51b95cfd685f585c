//! services/api/src/web/rest.rs
//!
//! Shared response plumbing for the REST API, the health and fallback
//! handlers, and the master definition for the OpenAPI specification.

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::contact::contact_handler,
        crate::web::auth::login_handler,
        crate::web::admin::list_data_handler,
        crate::web::admin::list_users_handler,
        crate::web::admin::update_incident_handler,
        crate::web::admin::respond_incident_handler,
        health_handler,
    ),
    components(schemas(
        ErrorBody,
        HealthResponse,
        crate::web::contact::ContactRequest,
        crate::web::contact::ContactResponse,
        crate::web::auth::LoginRequest,
        crate::web::auth::LoginResponse,
        crate::web::admin::UpdateIncidentRequest,
        crate::web::admin::RespondIncidentRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Contacto API", description = "Contact-form intake and admin endpoints.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token security scheme referenced by the admin paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

//=========================================================================================
// Shared Error Payload
//=========================================================================================

/// The JSON body returned for every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// The uniform handler error type: a status code plus a JSON error body.
pub type ErrorResponse = (StatusCode, Json<ErrorBody>);

/// Builds an `ErrorResponse` from a status code and message.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

//=========================================================================================
// Health and Fallback Handlers
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "API is running", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "API is running",
    })
}

#[derive(Serialize)]
struct NotFoundBody {
    error: &'static str,
    path: String,
    method: String,
}

/// Router fallback: unknown routes return a structured 404 with the path and
/// method that was attempted.
pub async fn fallback_handler(req: Request) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            error: "Ruta no encontrada",
            path: req.uri().path().to_string(),
            method: req.method().to_string(),
        }),
    )
}

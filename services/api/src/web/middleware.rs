//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting the admin routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::web::auth::verify_token;
use crate::web::rest::error_response;
use crate::web::state::AppState;

/// Middleware that validates the `Authorization: Bearer <token>` header.
///
/// If valid, inserts the decoded [`Claims`](crate::web::auth::Claims) into
/// request extensions for handlers to use. A missing token yields 401; a
/// present but invalid or expired token yields 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    // 1. Extract the bearer token from the Authorization header.
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "Acceso no autorizado: Token no proporcionado",
            )
            .into_response()
        })?;

    // 2. Validate it and recover the claims.
    let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        error_response(StatusCode::FORBIDDEN, "Acceso prohibido: Token no válido")
            .into_response()
    })?;

    // 3. Make the identity available to the handler.
    req.extensions_mut().insert(claims);

    // 4. Continue to the handler.
    Ok(next.run(req).await)
}

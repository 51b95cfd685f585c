pub mod admin;
pub mod auth;
pub mod contact;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// Builds the full application router over a prepared [`AppState`].
///
/// Kept out of the binary so tests can mount the same router over fake
/// adapters.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/contacto", post(contact::contact_handler))
        .route("/api/login", post(auth::login_handler))
        .route("/api/health", get(rest::health_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/api/admin/data", get(admin::list_data_handler))
        .route("/api/admin/users", get(admin::list_users_handler))
        .route("/api/admin/incidents/{id}", put(admin::update_incident_handler))
        .route(
            "/api/admin/incidents/{id}/respond",
            post(admin::respond_incident_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(rest::fallback_handler)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state)
}

//! services/api/src/web/auth.rs
//!
//! JWT issuing and validation plus the login endpoint.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::rest::{error_response, ErrorBody, ErrorResponse};
use crate::web::state::AppState;
use contacto_core::{domain::UserCredentials, ports::PortError};

/// Token validity window: 8 hours.
pub const TOKEN_VALIDITY_SECS: u64 = 8 * 60 * 60;

//=========================================================================================
// Claims
//=========================================================================================

/// The JWT claim set embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Expiration timestamp (seconds since UNIX epoch).
    pub exp: u64,
}

/// Token validation failures, kept separate from `PortError` because they map
/// to dedicated status codes (403, not 500).
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Issues a signed token for a user, valid for [`TOKEN_VALIDITY_SECS`].
pub fn issue_token(user: &UserCredentials, secret: &str) -> Result<String, TokenError> {
    let claims = Claims {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        exp: now_secs() + TOKEN_VALIDITY_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| TokenError::Invalid)
}

/// Decodes and validates a bearer token, returning its claims.
///
/// Validation: HS256, exp checked with the library's default leeway to
/// tolerate clock skew.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    Ok(data.claims)
}

//=========================================================================================
// Login Endpoint
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// POST /api/login - Exchange email + password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Wrong password", body = ErrorBody),
        (status = 404, description = "Unknown email", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let (email, password) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Email y contraseña son requeridos.",
            ))
        }
    };

    // 1. Look the user up by email.
    let user = state.db.get_user_by_email(email.trim()).await.map_err(|e| match e {
        PortError::NotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Usuario no encontrado.")
        }
        other => {
            error!("Failed to fetch user for login: {:?}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor.",
            )
        }
    })?;

    // 2. Verify the password against the stored argon2 hash.
    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
        error!("Failed to parse stored password hash: {:?}", e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error interno del servidor.",
        )
    })?;

    let valid = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Contraseña incorrecta.",
        ));
    }

    // 3. Issue the token.
    let token = issue_token(&user, &state.config.jwt_secret).map_err(|e| {
        error!("Failed to issue token: {:?}", e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error interno del servidor.",
        )
    })?;

    info!(user = %user.username, "login successful");
    Ok(Json(LoginResponse {
        message: "Login exitoso".to_string(),
        token,
    }))
}

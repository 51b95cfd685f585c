//! services/api/src/web/admin.rs
//!
//! The bearer-protected admin surface: list submissions and users, update an
//! incident's response status, and send a reply email for an incident.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::web::auth::Claims;
use crate::web::rest::{error_response, ErrorBody, ErrorResponse};
use crate::web::state::AppState;
use contacto_core::domain::{OutgoingEmail, ResponseStatus, ResponseUpdate, Submission};
use contacto_core::ports::PortError;

//=========================================================================================
// Request / Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct UpdateIncidentRequest {
    pub response_status: Option<String>,
    pub responded_by: Option<String>,
    pub response_message: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RespondIncidentRequest {
    pub response_message: Option<String>,
    pub response_subject: Option<String>,
}

#[derive(Serialize)]
pub struct IncidentResponse {
    pub message: String,
    pub incident: Submission,
}

fn parse_incident_id(raw: &str) -> Result<i64, ErrorResponse> {
    raw.parse::<i64>().map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "El id de la incidencia debe ser numérico",
        )
    })
}

//=========================================================================================
// Read-only Listings
//=========================================================================================

/// GET /api/admin/data - All submissions, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/data",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All stored submissions"),
        (status = 401, description = "No token", body = ErrorBody),
        (status = 403, description = "Bad token", body = ErrorBody),
        (status = 500, description = "Fetch failure", body = ErrorBody)
    )
)]
pub async fn list_data_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let submissions = state.db.list_submissions().await.map_err(|e| {
        error!("Failed to list submissions: {:?}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error al obtener los datos")
    })?;

    Ok(Json(submissions))
}

/// GET /api/admin/users - All admin users (no password material).
#[utoipa::path(
    get,
    path = "/api/admin/users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users as id/username/email"),
        (status = 401, description = "No token", body = ErrorBody),
        (status = 403, description = "Bad token", body = ErrorBody),
        (status = 500, description = "Fetch failure", body = ErrorBody)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let users = state.db.list_users().await.map_err(|e| {
        error!("Failed to list users: {:?}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error al obtener los usuarios")
    })?;

    Ok(Json(users))
}

//=========================================================================================
// Incident Mutations
//=========================================================================================

/// PUT /api/admin/incidents/{id} - Record a status change on an incident.
#[utoipa::path(
    put,
    path = "/api/admin/incidents/{id}",
    request_body = UpdateIncidentRequest,
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Numeric submission id")),
    responses(
        (status = 200, description = "Incident updated"),
        (status = 400, description = "Non-numeric id or missing/unknown status", body = ErrorBody),
        (status = 404, description = "No such incident", body = ErrorBody),
        (status = 500, description = "Update failure", body = ErrorBody)
    )
)]
pub async fn update_incident_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateIncidentRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let id = parse_incident_id(&id)?;

    let status = req
        .response_status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            error_response(StatusCode::BAD_REQUEST, "response_status es requerido")
        })?
        .parse::<ResponseStatus>()
        .map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                "response_status no es un estado válido",
            )
        })?;

    let responded_by = req
        .responded_by
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| claims.username.clone());

    let incident = state
        .db
        .update_response(
            id,
            ResponseUpdate {
                response_status: status,
                responded_by,
                response_date: Utc::now(),
                response_message: req.response_message.filter(|m| !m.trim().is_empty()),
            },
        )
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => {
                error_response(StatusCode::NOT_FOUND, "Incidencia no encontrada")
            }
            other => {
                error!(id, "failed to update incident: {:?}", other);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error al actualizar la incidencia",
                )
            }
        })?;

    info!(id, status = %status, by = %claims.username, "incident status updated");
    Ok(Json(IncidentResponse {
        message: "Incidencia actualizada".to_string(),
        incident,
    }))
}

/// POST /api/admin/incidents/{id}/respond - Email a reply to the submitter
/// and mark the incident resolved.
#[utoipa::path(
    post,
    path = "/api/admin/incidents/{id}/respond",
    request_body = RespondIncidentRequest,
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Numeric submission id")),
    responses(
        (status = 200, description = "Reply sent and incident resolved"),
        (status = 400, description = "Non-numeric id or missing response_message", body = ErrorBody),
        (status = 404, description = "No such incident", body = ErrorBody),
        (status = 500, description = "Mail send failure", body = ErrorBody)
    )
)]
pub async fn respond_incident_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<RespondIncidentRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let id = parse_incident_id(&id)?;

    // Reject an empty reply before touching the store or the mailer.
    let response_message = req
        .response_message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            error_response(StatusCode::BAD_REQUEST, "response_message es requerido")
        })?
        .to_string();

    let submission = state.db.get_submission(id).await.map_err(|e| match e {
        PortError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Incidencia no encontrada"),
        other => {
            error!(id, "failed to fetch incident: {:?}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al obtener la incidencia",
            )
        }
    })?;

    let subject = req
        .response_subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("Respuesta a su solicitud {}", submission.referencia));

    // The reply email is the primary effect here: a send failure fails the
    // request, while a bookkeeping failure afterwards does not undo it.
    state
        .mailer
        .send(reply_email(&submission, &subject, &response_message))
        .await
        .map_err(|e| {
            error!(id, "failed to send reply email: {:?}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al enviar el correo de respuesta",
            )
        })?;

    let update = ResponseUpdate {
        response_status: ResponseStatus::Resuelto,
        responded_by: claims.username.clone(),
        response_date: Utc::now(),
        response_message: Some(response_message),
    };

    let incident = match state.db.update_response(id, update).await {
        Ok(updated) => updated,
        Err(e) => {
            // The email already went out; report that truthfully instead of
            // pretending to roll it back.
            warn!(id, "reply sent but incident update failed: {:?}", e);
            submission
        }
    };

    info!(id, by = %claims.username, "incident replied and resolved");
    Ok(Json(IncidentResponse {
        message: "Respuesta enviada".to_string(),
        incident,
    }))
}

//=========================================================================================
// Email Composition
//=========================================================================================

fn reply_email(submission: &Submission, subject: &str, body: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: submission.email.clone(),
        subject: subject.to_string(),
        html_body: format!(
            "<p>Estimado/a {},</p><p>{}</p>\
             <p>Referencia de su solicitud: <strong>{}</strong></p>",
            submission.nombre,
            body.replace('\n', "<br>"),
            submission.referencia,
        ),
        text_body: format!(
            "Estimado/a {},\n\n{}\n\nReferencia de su solicitud: {}",
            submission.nombre, body, submission.referencia,
        ),
    }
}

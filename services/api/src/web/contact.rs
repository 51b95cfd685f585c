//! services/api/src/web/contact.rs
//!
//! The contact-form intake endpoint: validate, persist, classify, patch the
//! category back, and send the confirmation and notification emails. Only
//! validation and the primary insert can fail the request; every later step
//! is best-effort and merely softens the success message.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;
use contacto_core::domain::{Category, NewSubmission, OutgoingEmail, Submission};

//=========================================================================================
// Request / Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ContactRequest {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub asunto: Option<String>,
    pub mensaje: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// Validation failures carry the full field report, like the original form
/// backend did, so the frontend can highlight what is missing.
#[derive(Serialize, ToSchema)]
pub struct ContactValidationError {
    pub success: bool,
    pub error: String,
    pub required: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

#[derive(Serialize, ToSchema)]
pub struct ContactStorageError {
    pub success: bool,
    pub error: String,
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /api/contacto - Accept one contact-form submission.
#[utoipa::path(
    post,
    path = "/api/contacto",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Submission stored; message reflects any degraded steps", body = ContactResponse),
        (status = 400, description = "Missing required fields", body = ContactValidationError),
        (status = 500, description = "Storage failure", body = ContactStorageError)
    )
)]
pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    // 1. Validate: nombre, email and mensaje must be present and non-empty.
    let trimmed = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").to_string();
    let nombre = trimmed(&req.nombre);
    let email = trimmed(&req.email);
    let mensaje = trimmed(&req.mensaje);

    let mut missing = Vec::new();
    if nombre.is_empty() {
        missing.push("nombre");
    }
    if email.is_empty() {
        missing.push("email");
    }
    if mensaje.is_empty() {
        missing.push("mensaje");
    }
    if !missing.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ContactValidationError {
                success: false,
                error: "Error: Faltan campos requeridos".to_string(),
                required: vec!["nombre", "email", "mensaje"],
                missing,
            })
            .into_response(),
        ));
    }

    let telefono = req.telefono.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let asunto = req.asunto.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());

    // 2. Mint the reference token.
    let referencia = Uuid::new_v4();

    // 3. Persist. This is the only step allowed to fail the request.
    let submission = match state
        .db
        .insert_submission(NewSubmission {
            nombre,
            email,
            telefono,
            asunto: asunto.clone(),
            mensaje,
            referencia,
        })
        .await
    {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to insert submission: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ContactStorageError {
                    success: false,
                    error: "Error al guardar los datos en la base de datos".to_string(),
                })
                .into_response(),
            ));
        }
    };
    info!(id = submission.id, referencia = %referencia, "submission stored");

    // 4. Classify, best-effort.
    let categoria = match state
        .classifier
        .classify(asunto.as_deref().unwrap_or(""), &submission.mensaje)
        .await
    {
        Ok(c) => Some(c),
        Err(e) => {
            warn!(id = submission.id, "classification failed: {:?}", e);
            None
        }
    };

    // 5. Patch the category back, best-effort.
    let mut category_ok = false;
    if let Some(c) = categoria {
        match state.db.set_category(submission.id, c).await {
            Ok(()) => {
                info!(id = submission.id, categoria = %c, "category stored");
                category_ok = true;
            }
            Err(e) => warn!(id = submission.id, "failed to store category: {:?}", e),
        }
    }

    // 6. Send both emails, each attempted independently.
    let mut mails_ok = true;
    if let Err(e) = state.mailer.send(confirmation_email(&submission)).await {
        warn!(id = submission.id, "confirmation email failed: {:?}", e);
        mails_ok = false;
    }
    if let Err(e) = state
        .mailer
        .send(notification_email(&submission, categoria, &state.config.mail_to))
        .await
    {
        warn!(id = submission.id, "notification email failed: {:?}", e);
        mails_ok = false;
    }

    let message = match (category_ok, mails_ok) {
        (true, true) => "¡Éxito! Datos recibidos y correos enviados.",
        (false, true) => "Datos recibidos y correos enviados, pero el mensaje quedó sin clasificar.",
        (true, false) => "Datos recibidos, pero hubo un problema al enviar uno o más correos.",
        (false, false) => {
            "Datos recibidos, pero el mensaje quedó sin clasificar y hubo un problema al enviar uno o más correos."
        }
    };

    Ok(Json(ContactResponse {
        success: true,
        message: message.to_string(),
    }))
}

//=========================================================================================
// Email Composition
//=========================================================================================

fn confirmation_email(submission: &Submission) -> OutgoingEmail {
    OutgoingEmail {
        to: submission.email.clone(),
        subject: "Confirmación de recepción de solicitud".to_string(),
        html_body: format!(
            "<p>Su solicitud ha sido recibida. Número de referencia: <strong>{}</strong></p>",
            submission.referencia
        ),
        text_body: format!(
            "Su solicitud ha sido recibida. Número de referencia: {}",
            submission.referencia
        ),
    }
}

fn notification_email(
    submission: &Submission,
    categoria: Option<Category>,
    staff_address: &str,
) -> OutgoingEmail {
    let categoria_label = categoria.map(|c| c.as_str()).unwrap_or("Sin clasificar");
    let asunto = submission.asunto.as_deref().unwrap_or("Sin asunto");
    let telefono = submission.telefono.as_deref().unwrap_or("No proporcionado");

    OutgoingEmail {
        to: staff_address.to_string(),
        subject: format!("Nuevo Mensaje de Contacto ({}): {}", categoria_label, asunto),
        html_body: format!(
            "<h1>Nuevo Mensaje de Contacto</h1>\
             <p><strong>Referencia:</strong> {referencia}</p>\
             <p><strong>Categoría:</strong> {categoria}</p>\
             <hr>\
             <p><strong>Nombre:</strong> {nombre}</p>\
             <p><strong>Email:</strong> {email}</p>\
             <p><strong>Teléfono:</strong> {telefono}</p>\
             <hr>\
             <p><strong>Asunto:</strong> {asunto}</p>\
             <p><strong>Mensaje:</strong></p>\
             <p>{mensaje}</p>",
            referencia = submission.referencia,
            categoria = categoria_label,
            nombre = submission.nombre,
            email = submission.email,
            telefono = telefono,
            asunto = asunto,
            mensaje = submission.mensaje.replace('\n', "<br>"),
        ),
        text_body: format!(
            "Nuevo Mensaje de Contacto\n\
             Referencia: {}\nCategoría: {}\nNombre: {}\nEmail: {}\nTeléfono: {}\n\
             Asunto: {}\nMensaje:\n{}",
            submission.referencia,
            categoria_label,
            submission.nombre,
            submission.email,
            telefono,
            asunto,
            submission.mensaje,
        ),
    }
}

//! crates/contacto_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport; the category
//! and status enums carry serde derives because their Spanish labels are part
//! of the wire format on both the HTTP and storage side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The category assigned to a submission by the classifier.
///
/// A closed set: anything the model returns that cannot be matched to one of
/// the first three labels degrades to `Otro`, so free-form model output never
/// reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Queja,
    Sugerencia,
    Consulta,
    Otro,
}

impl Category {
    /// The canonical Spanish label, as stored and as shown to staff.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Queja => "Queja",
            Category::Sugerencia => "Sugerencia",
            Category::Consulta => "Consulta",
            Category::Otro => "Otro",
        }
    }

    /// Lenient parse of raw model output. The model is instructed to answer
    /// with exactly one label but occasionally wraps it in extra prose, so
    /// this scans for the first recognizable label instead of requiring an
    /// exact match. Unrecognizable output maps to `Otro`.
    pub fn from_model_output(raw: &str) -> Category {
        let lowered = raw.to_lowercase();
        if lowered.contains("queja") {
            Category::Queja
        } else if lowered.contains("sugerencia") {
            Category::Sugerencia
        } else if lowered.contains("consulta") {
            Category::Consulta
        } else {
            Category::Otro
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The response-tracking status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Pendiente,
    #[serde(rename = "En Progreso")]
    EnProgreso,
    Resuelto,
    Cerrado,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Pendiente => "Pendiente",
            ResponseStatus::EnProgreso => "En Progreso",
            ResponseStatus::Resuelto => "Resuelto",
            ResponseStatus::Cerrado => "Cerrado",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = ();

    /// Parses a client-supplied status string. Unlike the category parse this
    /// is strict: an unknown status is a caller error, not model noise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pendiente" => Ok(ResponseStatus::Pendiente),
            "En Progreso" => Ok(ResponseStatus::EnProgreso),
            "Resuelto" => Ok(ResponseStatus::Resuelto),
            "Cerrado" => Ok(ResponseStatus::Cerrado),
            _ => Err(()),
        }
    }
}

/// One contact-form record, as stored in the "clientes" table.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: i64,
    pub nombre: String,
    pub email: String,
    pub telefono: Option<String>,
    pub asunto: Option<String>,
    pub mensaje: String,
    /// Opaque correlation token minted at intake. Assigned exactly once and
    /// never changed.
    pub referencia: Uuid,
    /// Absent until classification completes; stays absent if it fails.
    pub categoria: Option<Category>,
    pub response_status: ResponseStatus,
    pub responded_by: Option<String>,
    pub response_date: Option<DateTime<Utc>>,
    pub response_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The fields the intake flow writes when creating a submission.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub nombre: String,
    pub email: String,
    pub telefono: Option<String>,
    pub asunto: Option<String>,
    pub mensaje: String,
    pub referencia: Uuid,
}

/// The fields the admin flow writes when recording a response.
#[derive(Debug, Clone)]
pub struct ResponseUpdate {
    pub response_status: ResponseStatus,
    pub responded_by: String,
    pub response_date: DateTime<Utc>,
    pub response_message: Option<String>,
}

/// An admin user, safe to return to clients.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Only used internally for login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// One outbound email, handed to the mail port fully composed.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

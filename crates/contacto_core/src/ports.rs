//! crates/contacto_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the
//! database, the classification API, or the SMTP transport.

use async_trait::async_trait;
use crate::domain::{
    Category, NewSubmission, OutgoingEmail, ResponseUpdate, Submission, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g. the
/// database driver, the HTTP client, the SMTP transport).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Submissions ("clientes") ---

    /// Inserts a new submission and returns the stored row.
    async fn insert_submission(&self, new: NewSubmission) -> PortResult<Submission>;

    /// Writes the classifier's category for an existing row. The intake flow
    /// calls this at most once per submission.
    async fn set_category(&self, id: i64, category: Category) -> PortResult<()>;

    async fn get_submission(&self, id: i64) -> PortResult<Submission>;

    async fn list_submissions(&self) -> PortResult<Vec<Submission>>;

    /// Records a response on an existing row and returns the updated row.
    async fn update_response(&self, id: i64, update: ResponseUpdate) -> PortResult<Submission>;

    // --- Users ---

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn list_users(&self) -> PortResult<Vec<User>>;
}

#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Classifies a submission's subject and message into one category.
    async fn classify(&self, asunto: &str, mensaje: &str) -> PortResult<Category>;
}

#[async_trait]
pub trait MailService: Send + Sync {
    /// Sends one composed email. Callers decide whether a failure is fatal;
    /// for the intake flow it never is.
    async fn send(&self, email: OutgoingEmail) -> PortResult<()>;
}

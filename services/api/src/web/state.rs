//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use contacto_core::ports::{ClassificationService, DatabaseService, MailService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The ports are trait objects so tests can substitute in-memory fakes for
/// the database, the classifier, and the mail transport.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub classifier: Arc<dyn ClassificationService>,
    pub mailer: Arc<dyn MailService>,
    pub config: Arc<Config>,
}

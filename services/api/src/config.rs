//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub jwt_secret: String,
    pub gemini_api_key: Option<String>,
    pub classifier_model: String,
    pub classifier_api_base: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_from: String,
    pub mail_to: String,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Auth Settings ---
        let jwt_secret = required("JWT_SECRET")?;

        // --- Load Classifier Settings ---
        // The key is optional at load time; the server binary rejects a
        // missing key when it constructs the classifier adapter, while the
        // auxiliary binaries (openapi, add-user) do not need one.
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        let classifier_model = std::env::var("CLASSIFIER_MODEL")
            .unwrap_or_else(|_| "gemini-1.5-flash-latest".to_string());
        let classifier_api_base = std::env::var("CLASSIFIER_API_BASE").unwrap_or_else(|_| {
            "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
        });

        // --- Load Mail Settings ---
        let smtp_host = required("SMTP_HOST")?;
        let smtp_port_str = std::env::var("SMTP_PORT").unwrap_or_else(|_| "465".to_string());
        let smtp_port = smtp_port_str
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("SMTP_PORT".to_string(), e.to_string()))?;
        let smtp_username = required("SMTP_USERNAME")?;
        let smtp_password = required("SMTP_PASSWORD")?;
        let mail_from = required("MAIL_FROM")?;
        let mail_to = required("MAIL_TO")?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            gemini_api_key,
            classifier_model,
            classifier_api_base,
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            mail_from,
            mail_to,
        })
    }
}

//! services/api/src/adapters/mailer.rs
//!
//! This module contains the outbound-mail adapter, implementing the
//! `MailService` port over an async SMTP transport (`lettre`).

use async_trait::async_trait;
use contacto_core::{
    domain::OutgoingEmail,
    ports::{MailService, PortError, PortResult},
};
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A mail adapter that implements the `MailService` port via SMTP.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Creates a new `SmtpMailer` connected to the configured relay.
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from: &str,
    ) -> Result<Self, PortError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| PortError::Unexpected(format!("Invalid MAIL_FROM address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .credentials(Credentials::new(username, password))
            .port(port)
            .build();

        Ok(Self { transport, from })
    }
}

//=========================================================================================
// `MailService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MailService for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> PortResult<()> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| PortError::Unexpected(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .multipart(MultiPart::alternative_plain_html(
                email.text_body,
                email.html_body,
            ))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

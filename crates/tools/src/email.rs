//! Outbound email
//!
//! Sends through an authenticated SMTP relay (STARTTLS). A relay without
//! sender credentials is treated as unconfigured: the send is refused
//! before any network activity.

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use maxwell_config::MailConfig;

/// Email sending errors
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Email configuration is incomplete. Set MAXWELL__MAIL__SENDER_EMAIL and MAXWELL__MAIL__PASSWORD.")]
    NotConfigured,

    #[error("Invalid address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    Send(String),
}

/// One outbound email
#[derive(Debug, Clone)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
}

/// SMTP mailer over the configured relay
#[derive(Debug, Clone)]
pub struct Mailer {
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Whether the relay is configured well enough to attempt a send
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Send one email through the relay
    pub async fn send(&self, request: &EmailRequest) -> Result<(), MailError> {
        if !self.is_configured() {
            return Err(MailError::NotConfigured);
        }

        let from = format!("{} <{}>", self.config.sender_name, self.config.sender_email);
        let mut builder = Message::builder()
            .from(parse_mailbox(&from)?)
            .to(parse_mailbox(&request.to)?)
            .subject(request.subject.clone());

        for cc in &request.cc {
            builder = builder.cc(parse_mailbox(cc)?);
        }
        for bcc in &request.bcc {
            builder = builder.bcc(parse_mailbox(bcc)?);
        }

        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(request.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)
            .map_err(|e| MailError::Send(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.sender_email.clone(),
                self.config.password.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        tracing::info!(to = %request.to, subject = %request.subject, "Email sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| {
        MailError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EmailRequest {
        EmailRequest {
            to: "prospect@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
            cc: vec![],
            bcc: vec![],
        }
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_refuses_without_network() {
        let mailer = Mailer::new(MailConfig::default());
        assert!(!mailer.is_configured());

        let result = mailer.send(&request()).await;
        assert!(matches!(result, Err(MailError::NotConfigured)));
    }

    #[test]
    fn test_parse_mailbox_with_display_name() {
        assert!(parse_mailbox("Maxwell <maxwell@criticalfuture.example>").is_ok());
        assert!(parse_mailbox("not-an-address").is_err());
    }
}

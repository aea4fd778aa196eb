//! SMTP mailer via lettre's async transport.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{error, info};
use uuid::Uuid;

use super::{Mailer, SendReceipt};
use crate::config::SmtpConfig;
use crate::error::MailError;

/// Port that speaks TLS from the first byte; everything else uses STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.from_address)?;

        let relay = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        };
        let builder = relay
            .map_err(|e| MailError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port);

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ))
        };

        info!(host = %config.host, port = config.port, from = %from, "SMTP mailer configured");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<SendReceipt, MailError> {
        let (email, message_id) = compose(&self.from, to, subject, html)?;

        self.transport.send(email).await.map_err(|e| {
            error!(to, subject, error = %e, "SMTP send failed");
            MailError::Transport(e.to_string())
        })?;

        info!(to, message_id = %message_id, "Email sent");
        Ok(SendReceipt {
            id: message_id,
            to: to.to_string(),
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Build an HTML message with a fresh Message-ID, returning both.
pub fn compose(
    from: &Mailbox,
    to: &str,
    subject: &str,
    html: &str,
) -> Result<(Message, String), MailError> {
    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let email = Message::builder()
        .from(from.clone())
        .to(parse_mailbox(to)?)
        .subject(subject)
        .message_id(Some(message_id.clone()))
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())
        .map_err(|e| MailError::Build(e.to_string()))?;

    Ok((email, message_id))
}

//! Outbound mail capability.
//!
//! The dispatcher only sees the [`Mailer`] trait; [`SmtpMailer`] is the
//! production implementation.

pub mod smtp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MailError;

pub use smtp::SmtpMailer;

/// Provider result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Provider message id.
    pub id: String,
    /// Mailbox the message was delivered to.
    pub to: String,
}

/// Sends one HTML email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<SendReceipt, MailError>;
}

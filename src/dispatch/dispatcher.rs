//! Submission dispatcher.
//!
//! Asks the [`SpamGate`] for a verdict, resolves the recipient and hands the
//! message to the [`Mailer`]. Every outcome, spam included, ends up as an
//! HTTP status plus [`Envelope`]; nothing escapes as an error.

use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::envelope::Envelope;
use crate::config::DEFAULT_EXPECTED_ACTION;
use crate::mail::{Mailer, SendReceipt};
use crate::routing::MailboxRouter;
use crate::spam::{SpamGate, SpamVerdict, SubmissionCheck};

/// A contact form submission.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Requested recipient; only honored when it is a configured mailbox.
    pub destination: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub honeypot: Option<String>,
    /// Epoch millis when the form became interactive.
    pub started_at_ms: Option<i64>,
    pub bot_token: Option<String>,
    /// Expected bot-score action; defaults to `contact_form`.
    pub action: Option<String>,
}

impl Submission {
    pub fn check(&self) -> SubmissionCheck<'_> {
        SubmissionCheck {
            honeypot: self.honeypot.as_deref(),
            started_at_ms: self.started_at_ms,
            bot_token: self.bot_token.as_deref(),
            expected_action: self.action.as_deref().unwrap_or(DEFAULT_EXPECTED_ACTION),
        }
    }
}

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Mail handed to the provider.
    Sent(SendReceipt),
    /// Judged spam; no mail sent.
    Dropped(SpamVerdict),
    /// The mailer failed with this message.
    Failed(String),
}

/// Caller-facing summary of an outcome.
///
/// The HTTP surface answers with an [`Envelope`] instead; this is what
/// library callers driving [`SubmissionDispatcher`] directly report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DispatchOutcome {
    pub fn result(&self) -> DispatchResult {
        match self {
            DispatchOutcome::Sent(receipt) => DispatchResult {
                accepted: true,
                provider_message_id: Some(receipt.id.clone()),
                error_message: None,
            },
            DispatchOutcome::Dropped(verdict) => DispatchResult {
                accepted: false,
                provider_message_id: None,
                error_message: verdict.reason.message().map(str::to_string),
            },
            DispatchOutcome::Failed(message) => DispatchResult {
                accepted: false,
                provider_message_id: None,
                error_message: Some(message.clone()),
            },
        }
    }
}

pub struct SubmissionDispatcher {
    gate: Arc<dyn SpamGate>,
    router: MailboxRouter,
    mailer: Arc<dyn Mailer>,
    silent_drop: bool,
}

impl SubmissionDispatcher {
    pub fn new(gate: Arc<dyn SpamGate>, router: MailboxRouter, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            gate,
            router,
            mailer,
            silent_drop: true,
        }
    }

    /// When disabled, spam gets a 400 carrying the gate's reason instead of a
    /// success-shaped answer.
    pub fn with_silent_drop(mut self, silent_drop: bool) -> Self {
        self.silent_drop = silent_drop;
        self
    }

    pub async fn dispatch(&self, submission: &Submission) -> DispatchOutcome {
        self.dispatch_at(submission, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// [`dispatch`](Self::dispatch) with an explicit clock reading.
    pub async fn dispatch_at(&self, submission: &Submission, now_ms: i64) -> DispatchOutcome {
        let verdict = self.gate.evaluate(&submission.check(), now_ms).await;
        if verdict.is_spam_likely {
            warn!(
                reason = ?verdict.reason,
                subject = %submission.subject,
                "Dropping suspected spam submission"
            );
            return DispatchOutcome::Dropped(verdict);
        }

        let to = self.recipient(submission);
        match self
            .mailer
            .send(to, &submission.subject, &submission.html_body)
            .await
        {
            Ok(receipt) => {
                info!(to, message_id = %receipt.id, "Submission dispatched");
                DispatchOutcome::Sent(receipt)
            }
            Err(e) => {
                error!(to, subject = %submission.subject, error = %e, "Submission dispatch failed");
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Configured destination if the client named one, routing rules otherwise.
    pub fn recipient<'a>(&'a self, submission: &'a Submission) -> &'a str {
        match submission.destination.as_deref().map(str::trim) {
            Some(requested) if !requested.is_empty() => {
                if self.router.is_known(requested) {
                    return requested;
                }
                warn!(requested, "Ignoring unknown destination mailbox");
                self.router.resolve(&submission.subject)
            }
            _ => self.router.resolve(&submission.subject),
        }
    }

    /// Status and envelope for an outcome.
    pub fn respond(&self, outcome: &DispatchOutcome) -> (StatusCode, Envelope<SendReceipt>) {
        match outcome {
            DispatchOutcome::Sent(receipt) => (StatusCode::OK, Envelope::ok(receipt.clone())),
            DispatchOutcome::Dropped(_) if self.silent_drop => (StatusCode::OK, Envelope::empty()),
            DispatchOutcome::Dropped(verdict) => (
                StatusCode::BAD_REQUEST,
                Envelope::failure(verdict.reason.message().unwrap_or("Submission rejected")),
            ),
            DispatchOutcome::Failed(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Envelope::failure(message.clone()),
            ),
        }
    }
}

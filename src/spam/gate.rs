//! Spam gate — the single spam-decision authority.
//!
//! Checks run in a fixed order, cheapest first, and stop at the first
//! failure so the bot-score round trip is only paid for submissions that
//! already look human:
//!
//! 1. honeypot
//! 2. timing
//! 3. bot score

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::honeypot::is_honeypot_clean;
use super::timing::TimingWindow;
use super::verifier::BotScoreVerifier;

/// The spam-relevant parts of a submission.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionCheck<'a> {
    pub honeypot: Option<&'a str>,
    /// Epoch millis when the form became interactive.
    pub started_at_ms: Option<i64>,
    pub bot_token: Option<&'a str>,
    pub expected_action: &'a str,
}

/// Why a submission was judged spam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    None,
    HoneypotFilled,
    TimingSuspicious,
    BotScoreLow,
}

impl ReasonCode {
    /// Human-readable reason, `None` for a clean submission.
    pub fn message(self) -> Option<&'static str> {
        match self {
            ReasonCode::None => None,
            ReasonCode::HoneypotFilled => Some("Honeypot field filled"),
            ReasonCode::TimingSuspicious => Some("Suspicious timing"),
            ReasonCode::BotScoreLow => Some("bot-score validation failed"),
        }
    }
}

/// Outcome of the gate for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamVerdict {
    pub is_spam_likely: bool,
    pub reason: ReasonCode,
}

impl SpamVerdict {
    pub fn clean() -> Self {
        Self {
            is_spam_likely: false,
            reason: ReasonCode::None,
        }
    }

    pub fn spam(reason: ReasonCode) -> Self {
        Self {
            is_spam_likely: true,
            reason,
        }
    }

    pub fn decision(&self) -> GateDecision {
        GateDecision {
            is_valid: !self.is_spam_likely,
            reason: self.reason.message().map(str::to_string),
        }
    }
}

/// Client-facing view of a verdict: `{isValid, reason?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Decides whether a submission is likely spam.
#[async_trait]
pub trait SpamGate: Send + Sync {
    async fn evaluate(&self, check: &SubmissionCheck<'_>, now_ms: i64) -> SpamVerdict;
}

/// Honeypot, then timing, then bot score.
pub struct DefaultSpamGate {
    verifier: Arc<dyn BotScoreVerifier>,
    timing: TimingWindow,
}

impl DefaultSpamGate {
    pub fn new(verifier: Arc<dyn BotScoreVerifier>) -> Self {
        Self {
            verifier,
            timing: TimingWindow::DEFAULT,
        }
    }

    pub fn with_timing(mut self, timing: TimingWindow) -> Self {
        self.timing = timing;
        self
    }
}

#[async_trait]
impl SpamGate for DefaultSpamGate {
    async fn evaluate(&self, check: &SubmissionCheck<'_>, now_ms: i64) -> SpamVerdict {
        if !is_honeypot_clean(check.honeypot) {
            debug!(reason = ?ReasonCode::HoneypotFilled, "Submission flagged");
            return SpamVerdict::spam(ReasonCode::HoneypotFilled);
        }

        let timing_ok = check
            .started_at_ms
            .is_some_and(|started| self.timing.is_plausible(started, now_ms));
        if !timing_ok {
            debug!(
                reason = ?ReasonCode::TimingSuspicious,
                started_at_ms = ?check.started_at_ms,
                now_ms,
                "Submission flagged"
            );
            return SpamVerdict::spam(ReasonCode::TimingSuspicious);
        }

        let verified = match check.bot_token {
            Some(token) => self.verifier.verify(token, check.expected_action).await,
            None => false,
        };
        if !verified {
            debug!(
                reason = ?ReasonCode::BotScoreLow,
                expected_action = check.expected_action,
                has_token = check.bot_token.is_some(),
                "Submission flagged"
            );
            return SpamVerdict::spam(ReasonCode::BotScoreLow);
        }

        SpamVerdict::clean()
    }
}

//! Bot-score verification against a reCAPTCHA-style siteverify endpoint.
//!
//! The verifier fails closed: a missing secret, a network error, a timeout,
//! a non-2xx status or a malformed payload all count as a failed check.
//! Nothing here returns an error to the caller.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::VerifierConfig;
use crate::error::VerifyError;

/// Decides whether a client-supplied token came from a human interaction.
#[async_trait]
pub trait BotScoreVerifier: Send + Sync {
    /// `true` only on a confirmed pass. Never fails loudly.
    async fn verify(&self, token: &str, expected_action: &str) -> bool;
}

/// Payload returned by the verification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotScoreResponse {
    pub success: bool,
    /// Confidence in [0, 1] that the interaction was human.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_ts: Option<String>,
    #[serde(default, rename = "error-codes", skip_serializing_if = "Vec::is_empty")]
    pub error_codes: Vec<String>,
}

impl BotScoreResponse {
    /// Decision rule: success, score at or above `min_score`, matching action.
    pub fn passes(&self, expected_action: &str, min_score: f64) -> bool {
        self.success && self.score >= min_score && self.action == expected_action
    }
}

/// HTTP verifier for reCAPTCHA v3 (and compatible services).
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    config: VerifierConfig,
}

impl RecaptchaVerifier {
    pub fn new(config: VerifierConfig) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VerifyError::Client(e.to_string()))?;

        if config.secret.is_none() {
            warn!("RECAPTCHA_SECRET_KEY not set; every bot-score check will fail");
        }

        Ok(Self { client, config })
    }

    /// Call the verification service once and parse its answer.
    pub async fn fetch(&self, token: &str) -> Result<BotScoreResponse, VerifyError> {
        let secret = self
            .config
            .secret
            .as_ref()
            .ok_or(VerifyError::MissingSecret)?;

        if token.trim().is_empty() {
            return Err(VerifyError::MissingToken);
        }

        let resp = self
            .client
            .post(&self.config.verify_url)
            .form(&[("secret", secret.expose_secret()), ("response", token)])
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VerifyError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| self.map_reqwest(e))?;
        serde_json::from_slice(&body).map_err(|e| VerifyError::Malformed(e.to_string()))
    }

    fn map_reqwest(&self, e: reqwest::Error) -> VerifyError {
        if e.is_timeout() {
            VerifyError::Timeout(self.config.timeout)
        } else {
            VerifyError::Request(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl BotScoreVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, expected_action: &str) -> bool {
        match self.fetch(token).await {
            Ok(resp) => {
                let passed = resp.passes(expected_action, self.config.min_score);
                if passed {
                    debug!(
                        score = resp.score,
                        action = %resp.action,
                        "Bot-score verification passed"
                    );
                } else {
                    warn!(
                        success = resp.success,
                        score = resp.score,
                        min_score = self.config.min_score,
                        action = %resp.action,
                        expected_action,
                        error_codes = ?resp.error_codes,
                        "Bot-score verification rejected"
                    );
                }
                passed
            }
            Err(e) => {
                warn!(
                    error = %e,
                    expected_action,
                    "Bot-score verification unavailable, failing closed"
                );
                false
            }
        }
    }
}

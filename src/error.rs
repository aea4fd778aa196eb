//! Error types for the contact relay.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Bot-score verification errors.
///
/// These never leave the verifier: every variant collapses into a failed
/// verification. They exist so the failure can be logged precisely.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Verification secret is not configured")]
    MissingSecret,

    #[error("No verification token supplied")]
    MissingToken,

    #[error("Verification request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Verification request failed: {0}")]
    Request(String),

    #[error("Verification service returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed verification response: {0}")]
    Malformed(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Mail-send errors. The message is surfaced to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("{0}")]
    Transport(String),
}

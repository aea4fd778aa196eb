//! Anti-spam checks guarding the contact pipeline.
//!
//! Two cheap local checks (honeypot, timing) and one remote check (bot score),
//! composed by the [`SpamGate`] into a single verdict.

pub mod gate;
pub mod honeypot;
pub mod timing;
pub mod verifier;

pub use gate::{DefaultSpamGate, GateDecision, ReasonCode, SpamGate, SpamVerdict, SubmissionCheck};
pub use honeypot::is_honeypot_clean;
pub use timing::{TimingWindow, is_timing_plausible};
pub use verifier::{BotScoreResponse, BotScoreVerifier, RecaptchaVerifier};

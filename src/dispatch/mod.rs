//! Submission dispatch — the boundary between browser forms and the mailer.

pub mod dispatcher;
pub mod envelope;
pub mod routes;

pub use dispatcher::{DispatchOutcome, DispatchResult, Submission, SubmissionDispatcher};
pub use envelope::Envelope;
pub use routes::{AppState, cors_layer, relay_routes};

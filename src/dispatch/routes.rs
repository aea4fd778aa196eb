//! HTTP endpoints for contact submissions.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

use super::dispatcher::{Submission, SubmissionDispatcher};
use super::envelope::Envelope;
use crate::config::DEFAULT_EXPECTED_ACTION;
use crate::spam::{GateDecision, SpamGate, SubmissionCheck};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<SubmissionDispatcher>,
    /// Same gate the dispatcher uses, backing the standalone
    /// `/api/verify-submission` diagnostic. Bot-score tokens are single-use,
    /// so a token checked there cannot be sent again to `/api/send-email`.
    pub gate: Arc<dyn SpamGate>,
}

/// Build the Axum router with the contact endpoints.
pub fn relay_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/send-email",
            post(send_email).fallback(method_not_allowed),
        )
        .route(
            "/api/verify-submission",
            post(verify_submission).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// CORS for the marketing site. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "contact-relay"
    }))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(Envelope::<()>::failure("Method not allowed")),
    )
}

fn bad_request(rejection: JsonRejection) -> axum::response::Response {
    debug!(error = %rejection.body_text(), "Rejected malformed submission body");
    (
        StatusCode::BAD_REQUEST,
        Json(Envelope::<()>::failure(rejection.body_text())),
    )
        .into_response()
}

// ── Send ────────────────────────────────────────────────────────────────

/// Body of `POST /api/send-email`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest {
    #[serde(default)]
    to: Option<String>,
    subject: String,
    html_message: String,
    #[serde(default)]
    honeypot: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    recaptcha_token: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

impl From<SendEmailRequest> for Submission {
    fn from(req: SendEmailRequest) -> Self {
        Self {
            destination: req.to,
            subject: req.subject,
            html_body: req.html_message,
            honeypot: req.honeypot,
            started_at_ms: req.timestamp,
            bot_token: req.recaptcha_token,
            action: req.action,
        }
    }
}

async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };

    let submission = Submission::from(body);
    let outcome = state.dispatcher.dispatch(&submission).await;
    let result = outcome.result();
    debug!(
        accepted = result.accepted,
        message_id = ?result.provider_message_id,
        error = ?result.error_message,
        "Send request handled"
    );

    let (status, envelope) = state.dispatcher.respond(&outcome);
    (status, Json(envelope)).into_response()
}

// ── Verify ──────────────────────────────────────────────────────────────

/// Body of `POST /api/verify-submission`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    #[serde(default)]
    recaptcha_token: Option<String>,
    #[serde(default)]
    honeypot: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    action: Option<String>,
}

/// Runs the full gate and reports its decision without sending anything.
///
/// This consumes the bot-score token. `/api/send-email` verifies its own
/// token, so it needs a fresh one.
async fn verify_submission(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };

    let check = SubmissionCheck {
        honeypot: body.honeypot.as_deref(),
        started_at_ms: body.timestamp,
        bot_token: body.recaptcha_token.as_deref(),
        expected_action: body.action.as_deref().unwrap_or(DEFAULT_EXPECTED_ACTION),
    };
    let verdict = state
        .gate
        .evaluate(&check, chrono::Utc::now().timestamp_millis())
        .await;

    (
        StatusCode::OK,
        Json(Envelope::<GateDecision>::ok(verdict.decision())),
    )
        .into_response()
}

use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::TraceLayer;

use contact_relay::config::AppConfig;
use contact_relay::dispatch::{AppState, SubmissionDispatcher, cors_layer, relay_routes};
use contact_relay::mail::{Mailer, SmtpMailer};
use contact_relay::routing::MailboxRouter;
use contact_relay::spam::{BotScoreVerifier, DefaultSpamGate, RecaptchaVerifier, SpamGate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage. Err means one is
    // already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;

    eprintln!("📮 Contact Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listen: http://0.0.0.0:{}", config.port);
    eprintln!("   Default mailbox: {}", config.routing.default_mailbox);
    for rule in &config.routing.rules {
        eprintln!("   Route: \"{}\" → {}", rule.subject_contains, rule.mailbox);
    }
    eprintln!(
        "   Bot score: {} (min {:.2}, timeout {:?})",
        if config.verifier.secret.is_some() {
            "enabled"
        } else {
            "NO SECRET, failing closed"
        },
        config.verifier.min_score,
        config.verifier.timeout,
    );
    eprintln!(
        "   Timing window: {}ms..{}ms",
        config.timing.min_elapsed_ms, config.timing.max_elapsed_ms
    );
    eprintln!(
        "   Silent drop: {}\n",
        if config.silent_drop { "on" } else { "off" }
    );

    // ── Spam gate ─────────────────────────────────────────────────────────
    let verifier: Arc<dyn BotScoreVerifier> = Arc::new(
        RecaptchaVerifier::new(config.verifier.clone()).context("building bot-score verifier")?,
    );
    let gate: Arc<dyn SpamGate> =
        Arc::new(DefaultSpamGate::new(verifier).with_timing(config.timing));

    // ── Mail ──────────────────────────────────────────────────────────────
    let mailer: Arc<dyn Mailer> =
        Arc::new(SmtpMailer::new(&config.smtp).context("building SMTP mailer")?);

    let dispatcher = SubmissionDispatcher::new(
        Arc::clone(&gate),
        MailboxRouter::from_config(&config.routing),
        mailer,
    )
    .with_silent_drop(config.silent_drop);

    let app = relay_routes(AppState {
        dispatcher: Arc::new(dispatcher),
        gate,
    })
    .layer(cors_layer(&config.allowed_origins))
    .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;
    tracing::info!(port = config.port, "Contact relay started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

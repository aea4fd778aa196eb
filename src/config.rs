//! Configuration types.
//!
//! Everything is read once at startup into an immutable [`AppConfig`] that is
//! handed to the verifier, router, mailer and dispatcher constructors.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::routing::RoutingRule;
use crate::spam::timing::TimingWindow;

/// Default bot-score verification endpoint (reCAPTCHA v3).
pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Default minimum bot score. Lenient on purpose; tune from the verifier logs.
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

/// Default action tag expected back from the verification service.
pub const DEFAULT_EXPECTED_ACTION: &str = "contact_form";

/// Bot-score verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Shared secret. `None` degrades the verifier to always-fail.
    pub secret: Option<SecretString>,
    pub verify_url: String,
    /// Inclusive lower bound on the returned score.
    pub min_score: f64,
    pub timeout: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            secret: None,
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            min_score: DEFAULT_MIN_SCORE,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Recipient routing configuration.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub default_mailbox: String,
    /// Ordered; first match wins.
    pub rules: Vec<RoutingRule>,
}

/// Outbound SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Answer suspected spam with a success-shaped response.
    pub silent_drop: bool,
    pub timing: TimingWindow,
    pub verifier: VerifierConfig,
    pub routing: RoutingConfig,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.into()));

        let port = parse_or(&get, "CONTACT_RELAY_PORT", 8080u16)?;

        let allowed_origins: Vec<String> = get("CONTACT_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let silent_drop = parse_or(&get, "CONTACT_SILENT_DROP", true)?;

        let timing = TimingWindow {
            min_elapsed_ms: parse_or(
                &get,
                "SPAM_MIN_ELAPSED_MS",
                TimingWindow::DEFAULT.min_elapsed_ms,
            )?,
            max_elapsed_ms: parse_or(
                &get,
                "SPAM_MAX_ELAPSED_MS",
                TimingWindow::DEFAULT.max_elapsed_ms,
            )?,
        };
        if timing.min_elapsed_ms > timing.max_elapsed_ms {
            return Err(ConfigError::InvalidValue {
                key: "SPAM_MIN_ELAPSED_MS".into(),
                message: format!(
                    "must not exceed SPAM_MAX_ELAPSED_MS ({})",
                    timing.max_elapsed_ms
                ),
            });
        }

        let min_score = parse_or(&get, "RECAPTCHA_MIN_SCORE", DEFAULT_MIN_SCORE)?;
        if !(0.0..=1.0).contains(&min_score) {
            return Err(ConfigError::InvalidValue {
                key: "RECAPTCHA_MIN_SCORE".into(),
                message: format!("{min_score} is outside [0, 1]"),
            });
        }

        let verifier = VerifierConfig {
            secret: get("RECAPTCHA_SECRET_KEY").map(SecretString::from),
            verify_url: get("RECAPTCHA_VERIFY_URL")
                .unwrap_or_else(|| DEFAULT_VERIFY_URL.to_string()),
            min_score,
            timeout: Duration::from_secs(parse_or(&get, "RECAPTCHA_TIMEOUT_SECS", 5u64)?),
        };

        let mut rules = Vec::new();
        if let Some(mailbox) = get("CONTACT_PARTNER_MAILBOX") {
            rules.push(RoutingRule::new("Partner", mailbox));
        }
        if let Some(mailbox) = get("CONTACT_FINANCING_MAILBOX") {
            rules.push(RoutingRule::new("Financing", mailbox));
        }
        let routing = RoutingConfig {
            default_mailbox: require("CONTACT_DEFAULT_MAILBOX")?,
            rules,
        };

        let username = get("SMTP_USERNAME").unwrap_or_default();
        let smtp = SmtpConfig {
            host: require("SMTP_HOST")?,
            port: parse_or(&get, "SMTP_PORT", 587u16)?,
            password: SecretString::from(get("SMTP_PASSWORD").unwrap_or_default()),
            from_address: get("MAIL_FROM_ADDRESS").unwrap_or_else(|| username.clone()),
            username,
        };

        Ok(Self {
            port,
            allowed_origins,
            silent_drop,
            timing,
            verifier,
            routing,
            smtp,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("CONTACT_DEFAULT_MAILBOX", "hello@example.com"),
        ("SMTP_HOST", "smtp.example.com"),
    ];

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(MINIMAL)).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.silent_drop);
        assert_eq!(config.allowed_origins, vec!["*"]);
        assert_eq!(config.timing, TimingWindow::DEFAULT);
        assert!(config.verifier.secret.is_none());
        assert_eq!(config.verifier.min_score, 0.3);
        assert_eq!(config.verifier.timeout, Duration::from_secs(5));
        assert_eq!(config.verifier.verify_url, DEFAULT_VERIFY_URL);
        assert_eq!(config.routing.default_mailbox, "hello@example.com");
        assert!(config.routing.rules.is_empty());
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn missing_default_mailbox_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("SMTP_HOST", "smtp.example.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(k) if k == "CONTACT_DEFAULT_MAILBOX"));
    }

    #[test]
    fn missing_secret_is_not_an_error() {
        let config = AppConfig::from_lookup(lookup(MINIMAL)).unwrap();
        assert!(config.verifier.secret.is_none());
    }

    #[test]
    fn blank_secret_counts_as_unset() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("RECAPTCHA_SECRET_KEY", "   "));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.verifier.secret.is_none());
    }

    #[test]
    fn topic_mailboxes_become_ordered_rules() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("CONTACT_PARTNER_MAILBOX", "partners@example.com"));
        pairs.push(("CONTACT_FINANCING_MAILBOX", "finance@example.com"));
        pairs.push(("RECAPTCHA_SECRET_KEY", "s3cret"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        let rules = &config.routing.rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].subject_contains, "Partner");
        assert_eq!(rules[0].mailbox, "partners@example.com");
        assert_eq!(rules[1].subject_contains, "Financing");
        assert_eq!(
            config.verifier.secret.as_ref().map(|s| s.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
    }

    #[test]
    fn invalid_number_reports_key() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("SMTP_PORT", "not-a-port"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "SMTP_PORT"));
    }

    #[test]
    fn score_outside_unit_interval_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("RECAPTCHA_MIN_SCORE", "1.5"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn inverted_timing_window_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("SPAM_MIN_ELAPSED_MS", "10000"));
        pairs.push(("SPAM_MAX_ELAPSED_MS", "5000"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn silent_drop_can_be_disabled() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("CONTACT_SILENT_DROP", "false"));
        pairs.push(("CONTACT_ALLOWED_ORIGINS", "https://example.com, https://www.example.com"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(!config.silent_drop);
        assert_eq!(
            config.allowed_origins,
            vec!["https://example.com", "https://www.example.com"]
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("RECAPTCHA_SECRET_KEY", "very-secret-value"));
        pairs.push(("SMTP_PASSWORD", "hunter2"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret-value"));
        assert!(!debug.contains("hunter2"));
    }
}

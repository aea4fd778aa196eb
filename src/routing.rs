//! Recipient routing for contact submissions.
//!
//! Rules are tried in order against the subject line; the first rule whose
//! fragment appears in the subject picks the mailbox. Nothing matching falls
//! back to the default mailbox.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RoutingConfig;

/// Route subjects containing `subject_contains` to `mailbox`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub subject_contains: String,
    pub mailbox: String,
}

impl RoutingRule {
    pub fn new(subject_contains: impl Into<String>, mailbox: impl Into<String>) -> Self {
        Self {
            subject_contains: subject_contains.into(),
            mailbox: mailbox.into(),
        }
    }

    /// Case-sensitive substring match.
    pub fn matches(&self, subject: &str) -> bool {
        subject.contains(&self.subject_contains)
    }
}

/// Ordered, immutable routing table.
#[derive(Debug, Clone)]
pub struct MailboxRouter {
    default_mailbox: String,
    rules: Vec<RoutingRule>,
}

impl MailboxRouter {
    pub fn new(default_mailbox: impl Into<String>, rules: Vec<RoutingRule>) -> Self {
        Self {
            default_mailbox: default_mailbox.into(),
            rules,
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.default_mailbox.clone(), config.rules.clone())
    }

    /// Mailbox for a subject line.
    pub fn resolve(&self, subject: &str) -> &str {
        match self.rules.iter().find(|rule| rule.matches(subject)) {
            Some(rule) => {
                debug!(
                    rule = %rule.subject_contains,
                    mailbox = %rule.mailbox,
                    "Routing rule matched"
                );
                &rule.mailbox
            }
            None => &self.default_mailbox,
        }
    }

    /// Whether `mailbox` is the default or a rule target (case-insensitive).
    pub fn is_known(&self, mailbox: &str) -> bool {
        self.default_mailbox.eq_ignore_ascii_case(mailbox)
            || self
                .rules
                .iter()
                .any(|rule| rule.mailbox.eq_ignore_ascii_case(mailbox))
    }

    pub fn default_mailbox(&self) -> &str {
        &self.default_mailbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> MailboxRouter {
        MailboxRouter::new(
            "hello@example.com",
            vec![
                RoutingRule::new("Partner", "partners@example.com"),
                RoutingRule::new("Financing", "finance@example.com"),
            ],
        )
    }

    #[test]
    fn matching_rule_wins() {
        let r = router();
        assert_eq!(r.resolve("Partner inquiry"), "partners@example.com");
        assert_eq!(r.resolve("Financing question"), "finance@example.com");
        assert_eq!(r.resolve("New Partner program"), "partners@example.com");
    }

    #[test]
    fn first_match_wins_when_several_match() {
        assert_eq!(
            router().resolve("Financing for Partner accounts"),
            "partners@example.com"
        );
    }

    #[test]
    fn no_match_falls_back_to_default() {
        let r = router();
        assert_eq!(r.resolve("General question"), "hello@example.com");
        assert_eq!(r.resolve(""), "hello@example.com");
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(router().resolve("partner inquiry"), "hello@example.com");
    }

    #[test]
    fn empty_table_always_uses_default() {
        let r = MailboxRouter::new("hello@example.com", vec![]);
        assert_eq!(r.resolve("Partner inquiry"), "hello@example.com");
    }

    #[test]
    fn known_mailboxes() {
        let r = router();
        assert!(r.is_known("hello@example.com"));
        assert!(r.is_known("Partners@Example.com"));
        assert!(!r.is_known("attacker@evil.com"));
    }
}

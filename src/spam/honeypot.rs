//! Honeypot check.
//!
//! The form renders a decoy input hidden from people. Anything typed into it
//! came from an agent that fills every field.

/// Returns `true` when the decoy field is absent or blank.
pub fn is_honeypot_clean(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

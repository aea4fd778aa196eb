//! Uniform response envelope: `{success, response, error}`.

use serde::{Deserialize, Serialize};

/// Every endpoint answers with this shape; absent parts serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub response: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(response: T) -> Self {
        Self {
            success: true,
            response: Some(response),
            error: None,
        }
    }

    /// Success with nothing to report. Also what a silently dropped submission gets.
    pub fn empty() -> Self {
        Self {
            success: true,
            response: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_serializes_explicit_nulls() {
        let json = serde_json::to_value(Envelope::<String>::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "response": null, "error": null})
        );
    }

    #[test]
    fn failure_carries_message() {
        let json = serde_json::to_value(Envelope::<String>::failure("SMTP timeout")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "response": null, "error": "SMTP timeout"})
        );
    }

    #[test]
    fn ok_wraps_response() {
        let json = serde_json::to_value(Envelope::ok(serde_json::json!({"id": "abc"}))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["response"]["id"], "abc");
        assert!(json["error"].is_null());
    }
}

// Error taxonomy shared by every layer of the crate.
//
// Remote failures are folded into `RemoteApiError` exactly once, at the
// API boundary (see `RemoteApiError::from_value`). Nothing above that
// boundary looks at the raw shape of what the server sent back.

use serde_json::Value;
use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed user input, caught before any remote call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or malformed endpoint / credential configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    RemoteApi(#[from] RemoteApiError),

    /// More than one identity matched an email that should be unique.
    #[error("Ambiguous result: {count} users share the email {email}")]
    AmbiguousResult { email: String, count: usize },

    /// The interactive terminal failed (closed stdin, not a tty, ...).
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Uniform shape of every failure surfaced by the remote service.
///
/// `message` is already fully formatted for display, so callers only ever
/// print it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteApiError {
    pub status_code: Option<u16>,
    pub message: String,
}

const DEFAULT_REMOTE_MESSAGE: &str = "Unknown error";

impl RemoteApiError {
    /// Normalize whatever the remote side produced into a `RemoteApiError`.
    ///
    /// - an object with a numeric `statusCode` renders as
    ///   `Remote API Error ({code}): {message}`
    /// - an object with only a `message` renders as `Remote API: {message}`
    /// - anything else is stringified into `Remote API: {value}`
    pub fn from_value(value: &Value) -> Self {
        let status_code = value
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty());

        match (status_code, message) {
            (Some(code), msg) => Self {
                status_code: Some(code),
                message: format!(
                    "Remote API Error ({}): {}",
                    code,
                    msg.unwrap_or(DEFAULT_REMOTE_MESSAGE)
                ),
            },
            (None, Some(msg)) => Self {
                status_code: None,
                message: format!("Remote API: {}", msg),
            },
            (None, None) => {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Self {
                    status_code: None,
                    message: format!("Remote API: {}", raw),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn status_and_message() {
        let err = RemoteApiError::from_value(&json!({"statusCode": 404, "message": "User not found"}));
        assert_eq!(err.status_code, Some(404));
        assert_eq!(err.to_string(), "Remote API Error (404): User not found");
    }

    #[test]
    fn status_without_message_uses_default() {
        let err = RemoteApiError::from_value(&json!({"statusCode": 500}));
        assert_eq!(err.to_string(), "Remote API Error (500): Unknown error");
    }

    #[test]
    fn message_only() {
        let err = RemoteApiError::from_value(&json!({"message": "timeout"}));
        assert_eq!(err.status_code, None);
        assert_eq!(err.to_string(), "Remote API: timeout");
    }

    #[test]
    fn bare_string_is_stringified() {
        let err = RemoteApiError::from_value(&json!("connection reset"));
        assert_eq!(err.to_string(), "Remote API: connection reset");
    }

    #[test]
    fn unrecognised_object_is_stringified() {
        let err = RemoteApiError::from_value(&json!({"error": "boom"}));
        assert_eq!(err.to_string(), r#"Remote API: {"error":"boom"}"#);
    }

    #[test]
    fn remote_error_passes_through_error_display() {
        let err: Error = RemoteApiError::from_value(&json!({"statusCode": 403, "message": "Insufficient scope"})).into();
        assert_eq!(err.to_string(), "Remote API Error (403): Insufficient scope");
    }
}

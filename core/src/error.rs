//! Error types for the market API client.
//!
//! # Design
//! Three failure kinds reach callers: a draft that is missing a required
//! field (`Validation`, never sent), a request the server or network
//! rejected (`Request`), and a body that does not match the expected type
//! (`Decoding`). A 404 is an ordinary `Request` with `status == Some(404)`;
//! `is_not_found` keeps that check short at call sites.

/// Errors returned by `MarketClient` and `ProductService`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required draft field is absent. Raised before any request exists.
    #[error("missing required field `{field}`")]
    Validation { field: &'static str },

    /// Non-2xx status (`status` set) or a transport failure such as DNS,
    /// connection reset or timeout (`status` is `None`).
    #[error("request failed ({}): {}", status_label(.status), message_label(.message))]
    Request {
        status: Option<u16>,
        message: Option<String>,
    },

    /// The response body could not be decoded into `target`.
    #[error("failed to decode {target}: {reason}")]
    Decoding { target: &'static str, reason: String },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The caller's cancellation token fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ApiError::Request {
            status: None,
            message: Some(message.into()),
        }
    }
}

fn message_label(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("no message")
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "transport".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_display_includes_status_and_message() {
        let err = ApiError::Request {
            status: Some(410),
            message: Some("gone".to_string()),
        };
        assert_eq!(err.to_string(), "request failed (HTTP 410): gone");
    }

    #[test]
    fn transport_error_has_no_status() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "request failed (transport): connection refused");
    }

    #[test]
    fn not_found_is_a_404_request_error() {
        let err = ApiError::Request {
            status: Some(404),
            message: None,
        };
        assert!(err.is_not_found());
        assert!(!ApiError::Cancelled.is_not_found());
    }
}

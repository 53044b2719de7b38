//! Error types for the I/O boundaries around the drain engine

use std::time::Duration;
use thiserror::Error;

/// A rendered page failed to load or never showed the expected markup
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("timed out after {waited:?} waiting for `{selector}` on {url}")]
    Timeout {
        url: String,
        selector: String,
        waited: Duration,
    },

    #[error("could not read page markup: {0}")]
    Markup(String),
}

/// The forms directory could not be queried
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("forms API request failed: {0}")]
    Transport(String),

    #[error("forms API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode forms API response: {0}")]
    Decode(String),
}

/// A single entry deletion did not succeed
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("delete request failed: {0}")]
    Transport(String),

    #[error("delete returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl DeleteError {
    /// The API reported the entry as already gone
    pub fn is_missing_target(&self) -> bool {
        matches!(self, Self::Status { status: 404 | 410, .. })
    }
}

/// Setup failures that prevent a run from starting
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not start WebDriver session at {url}: {message}")]
    WebDriver { url: String, message: String },

    #[error("could not build HTTP client: {0}")]
    Http(String),

    #[error("API key is not a valid header value")]
    InvalidCredential,

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_statuses() {
        let not_found = DeleteError::Status {
            status: 404,
            body: String::new(),
        };
        let gone = DeleteError::Status {
            status: 410,
            body: String::new(),
        };
        let server = DeleteError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert!(not_found.is_missing_target());
        assert!(gone.is_missing_target());
        assert!(!server.is_missing_target());
        assert!(!DeleteError::Transport("reset".into()).is_missing_target());
    }

    #[test]
    fn test_status_error_message_carries_body() {
        let err = LookupError::Status {
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "forms API returned 401: unauthorized");
    }

    #[test]
    fn test_timeout_message_names_selector() {
        let err = ExtractionError::Timeout {
            url: "https://example.test/org/".into(),
            selector: "span.total-entries".into(),
            waited: Duration::from_secs(60),
        };
        let msg = err.to_string();
        assert!(msg.contains("span.total-entries"));
        assert!(msg.contains("60s"));
    }
}

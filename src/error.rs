//! Error types for the handshake
//!
//! Every failure a step can produce ends up as a [`HandshakeError`]. The
//! orchestrator never lets one escape: it logs the diagnostic context and
//! turns it into an aborted outcome.

use serde::Serialize;
use thiserror::Error;

use crate::steps::StepKind;

/// Maximum number of body characters kept in transport error messages
const BODY_EXCERPT_CHARS: usize = 200;

/// Main error type for a handshake run
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandshakeError {
    /// Connection failure (`status` is `None`) or a non-2xx response
    #[error("{step}: transport error{}: {message}", status_suffix(.status))]
    Transport {
        step: StepKind,
        status: Option<u16>,
        message: String,
    },

    #[error("{step}: response could not be decoded: {message}")]
    Decode {
        step: StepKind,
        message: String,
        /// Full response text, kept for diagnostics
        raw_body: String,
    },

    #[error("{step}: required token '{field}' not found")]
    MissingToken { step: StepKind, field: String },

    #[error("manual confirmation declined: {reason}")]
    UserDeclined { reason: String },

    #[error("session field '{field}' already holds '{existing}', refusing '{incoming}'")]
    StateConflict {
        field: &'static str,
        existing: String,
        incoming: String,
    },

    #[error("{step}: service rejected the request with code {code}: {message}")]
    ServiceRejected {
        step: StepKind,
        code: String,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl HandshakeError {
    pub(crate) fn status(step: StepKind, status: u16, body: &str) -> Self {
        Self::Transport {
            step,
            status: Some(status),
            message: body.chars().take(BODY_EXCERPT_CHARS).collect(),
        }
    }

    /// Step the error was raised in, if it belongs to one
    pub fn step(&self) -> Option<StepKind> {
        match self {
            Self::Transport { step, .. }
            | Self::Decode { step, .. }
            | Self::MissingToken { step, .. }
            | Self::ServiceRejected { step, .. } => Some(*step),
            Self::UserDeclined { .. } | Self::StateConflict { .. } => None,
        }
    }

    /// Raw response body captured by a decode failure
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::Decode { raw_body, .. } => Some(raw_body),
            _ => None,
        }
    }
}

/// Applicant validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicantError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("birth date '{0}' must be 8 digits (YYYYMMDD)")]
    BirthFormat(String),

    #[error("birth date '{0}' is not a calendar date")]
    BirthDate(String),

    #[error("phone number '{0}' must contain 10 or 11 digits")]
    Phone(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_with_status() {
        let err = HandshakeError::status(StepKind::IssueTicket, 503, "unavailable");
        assert_eq!(
            err.to_string(),
            "issue-ticket: transport error (HTTP 503): unavailable"
        );
    }

    #[test]
    fn test_transport_display_without_status() {
        let err = HandshakeError::Transport {
            step: StepKind::Exchange,
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "exchange: transport error: connection refused"
        );
    }

    #[test]
    fn test_status_body_is_truncated() {
        let body = "x".repeat(1000);
        match HandshakeError::status(StepKind::PollResult, 500, &body) {
            HandshakeError::Transport { message, .. } => {
                assert_eq!(message.len(), BODY_EXCERPT_CHARS)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_raw_body_only_on_decode() {
        let decode = HandshakeError::Decode {
            step: StepKind::PollResult,
            message: "expected value".to_string(),
            raw_body: "<html>oops</html>".to_string(),
        };
        assert_eq!(decode.raw_body(), Some("<html>oops</html>"));
        assert_eq!(decode.step(), Some(StepKind::PollResult));

        let declined = HandshakeError::UserDeclined {
            reason: "no".to_string(),
        };
        assert_eq!(declined.raw_body(), None);
        assert_eq!(declined.step(), None);
    }
}

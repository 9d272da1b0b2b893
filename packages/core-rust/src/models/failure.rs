//! Public failure surface: error codes, failure messages, classification.
//!
//! Every failed exchange classifies onto exactly one of three codes. The
//! mapping is deterministic and total, so listeners can branch on the code
//! without a catch-all they never expect to hit.

use std::fmt;
use std::sync::Arc;

use crate::contract;
use crate::transport::TransportError;

const NETWORK_UNAVAILABLE_MESSAGE: &str =
    "Network unavailable. Check your connection and try again.";
const UNKNOWN_MESSAGE: &str = "Something went wrong. Please try again later.";

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Canonical error codes reported through listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The service could not be reached: connectivity problem or timeout.
    NetworkError,
    /// The service answered, but the payload was not valid JSON.
    ServiceResponseError,
    /// Everything else, including non-success HTTP statuses.
    Unknown,
}

impl ErrorCode {
    /// Stable string form, as surfaced in [`FailureMessage::code`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::ServiceResponseError => "SERVICE_RESPONSE_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Default human-readable message for this code.
    ///
    /// `ServiceResponseError` and `Unknown` share one message on purpose:
    /// callers distinguish them by code, users should not have to.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::NetworkError => NETWORK_UNAVAILABLE_MESSAGE,
            Self::ServiceResponseError | Self::Unknown => UNKNOWN_MESSAGE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TransceiveError
// ---------------------------------------------------------------------------

/// Failure produced while driving one exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransceiveError {
    /// The transport failed before a payload was produced.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A payload arrived but could not be parsed as JSON.
    #[error("response payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// FailureMessage
// ---------------------------------------------------------------------------

/// Failure delivered to listeners when an exchange produces no result.
#[derive(Debug, Clone)]
pub struct FailureMessage {
    code: String,
    message: String,
    cause: Option<Arc<anyhow::Error>>,
}

impl FailureMessage {
    /// Creates a failure with a custom string code.
    ///
    /// Use this for codes outside [`ErrorCode`], such as service-specific
    /// codes lifted out of a payload. Both `code` and `message` must be
    /// non-empty.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        cause: Option<anyhow::Error>,
    ) -> Self {
        let code = code.into();
        let message = message.into();
        contract::require_non_empty(&code, "failure code must not be empty");
        contract::require_non_empty(&message, "failure message must not be empty");
        Self {
            code,
            message,
            cause: cause.map(Arc::new),
        }
    }

    /// Creates a failure carrying a canonical code and its default message.
    #[must_use]
    pub fn with_code(code: ErrorCode, cause: Option<anyhow::Error>) -> Self {
        Self {
            code: code.as_str().to_owned(),
            message: code.default_message().to_owned(),
            cause: cause.map(Arc::new),
        }
    }

    /// Classifies an exchange failure onto the public error surface.
    ///
    /// Connectivity problems and timeouts map to `NETWORK_ERROR`,
    /// unparseable payloads map to `SERVICE_RESPONSE_ERROR`, everything
    /// else maps to `UNKNOWN`. The original error is kept as the cause.
    #[must_use]
    pub fn classify(error: TransceiveError) -> Self {
        let code = match &error {
            TransceiveError::Transport(
                TransportError::Connectivity(_) | TransportError::Timeout,
            ) => ErrorCode::NetworkError,
            TransceiveError::Parse(_) => ErrorCode::ServiceResponseError,
            TransceiveError::Transport(_) => ErrorCode::Unknown,
        };
        Self::with_code(code, Some(error.into()))
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying cause, when one was captured.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// True when this failure carries the canonical string for `code`.
    #[must_use]
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code.as_str()
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {} message: {}", self.code, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " cause: {cause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("<html>").expect_err("must not parse")
    }

    #[test]
    fn connectivity_classifies_as_network_error() {
        let failure = FailureMessage::classify(
            TransportError::Connectivity(anyhow::anyhow!("connection refused")).into(),
        );
        assert!(failure.is(ErrorCode::NetworkError));
        assert_eq!(failure.code(), "NETWORK_ERROR");
    }

    #[test]
    fn timeout_classifies_as_network_error() {
        let failure = FailureMessage::classify(TransportError::Timeout.into());
        assert!(failure.is(ErrorCode::NetworkError));
    }

    #[test]
    fn unparseable_payload_classifies_as_service_response_error() {
        let failure = FailureMessage::classify(parse_error().into());
        assert!(failure.is(ErrorCode::ServiceResponseError));
    }

    #[test]
    fn remaining_transport_failures_classify_as_unknown() {
        for error in [
            TransportError::Status { status: 500 },
            TransportError::Aborted,
            TransportError::Other(anyhow::anyhow!("tls handshake")),
        ] {
            let failure = FailureMessage::classify(error.into());
            assert!(failure.is(ErrorCode::Unknown), "got {}", failure.code());
        }
    }

    #[test]
    fn unknown_and_service_response_share_default_message() {
        assert_eq!(
            ErrorCode::Unknown.default_message(),
            ErrorCode::ServiceResponseError.default_message()
        );
        assert_ne!(
            ErrorCode::Unknown.default_message(),
            ErrorCode::NetworkError.default_message()
        );
    }

    #[test]
    fn classification_keeps_the_cause() {
        let failure = FailureMessage::classify(TransportError::Timeout.into());
        let cause = failure.cause().expect("cause captured");
        assert!(cause.to_string().contains("timed out"));
    }

    #[test]
    fn custom_code_round_trips() {
        let failure = FailureMessage::new("QUOTA_EXCEEDED", "Daily quota exhausted.", None);
        assert_eq!(failure.code(), "QUOTA_EXCEEDED");
        assert_eq!(failure.message(), "Daily quota exhausted.");
        assert!(failure.cause().is_none());
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn empty_code_is_a_contract_violation() {
        let _ = FailureMessage::new("", "message", None);
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn empty_message_is_a_contract_violation() {
        let _ = FailureMessage::new("CODE", "", None);
    }

    #[test]
    fn display_includes_code_message_and_cause() {
        let failure = FailureMessage::with_code(
            ErrorCode::NetworkError,
            Some(anyhow::anyhow!("socket closed")),
        );
        let rendered = failure.to_string();
        assert!(rendered.starts_with("code: NETWORK_ERROR message: "));
        assert!(rendered.contains("cause: socket closed"));
    }
}

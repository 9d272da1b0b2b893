//! Boundary between the SDK and whatever actually moves bytes.
//!
//! The transceiver treats a [`Transport`] as a black box: hand it a request,
//! get back either a raw payload or a [`TransportError`]. Cancellation is
//! driven from outside through a [`TransportHandle`], so implementations
//! never poll cancellation state themselves.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::models::DataRequest;

// ---------------------------------------------------------------------------
// RawResponse
// ---------------------------------------------------------------------------

/// Raw payload handed back by a transport on success.
///
/// The body is still unparsed; the transceiver owns turning it into JSON.
/// Headers are carried for transport-level diagnostics.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub body: Bytes,
    pub headers: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failure reported by a transport.
///
/// [`FailureMessage::classify`](crate::models::FailureMessage::classify)
/// maps every variant onto one of the public error codes; a new variant
/// must keep that mapping total.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The remote endpoint could not be reached at all.
    #[error("could not reach the service: {0}")]
    Connectivity(#[source] anyhow::Error),
    /// The exchange did not finish within the transport deadline.
    #[error("request timed out")]
    Timeout,
    /// The in-flight exchange was aborted through its [`TransportHandle`].
    #[error("request aborted")]
    Aborted,
    /// The service answered with a non-success status code.
    #[error("service answered with status {status}")]
    Status { status: u16 },
    /// Anything the transport could not classify further.
    #[error("transport failure: {0}")]
    Other(#[source] anyhow::Error),
}

// ---------------------------------------------------------------------------
// TransportHandle
// ---------------------------------------------------------------------------

/// Abort handle attached to a request while its exchange is in flight.
///
/// Clones share one signal. Aborting is best-effort: an exchange that
/// already settled still delivers its outcome.
#[derive(Debug, Clone, Default)]
pub struct TransportHandle {
    token: CancellationToken,
}

impl TransportHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Signals the transport to abandon the in-flight exchange.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// True once [`abort`](Self::abort) has been called on any clone.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the handle is aborted. Completes immediately if the
    /// abort already happened.
    pub async fn aborted(&self) {
        self.token.cancelled().await;
    }
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// One-shot request executor.
///
/// `perform` runs a single exchange for `request` and reports the outcome.
/// The transceiver calls it at most once per request and races it against
/// the abort signal, so a slow implementation is simply dropped mid-flight
/// when the request is cancelled.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: &DataRequest) -> Result<RawResponse, TransportError>;
}

//! Submission pipeline: one request in, exactly one listener callback out.
//!
//! The transceiver owns everything between "caller hands over a request"
//! and "listener hears the outcome": skipping already-cancelled requests,
//! racing the transport against the abort signal, parsing the payload, and
//! classifying failures.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::debug;

use crate::contract;
use crate::models::{DataRequest, DataTransaction, FailureMessage, TransceiveError};
use crate::transport::{RawResponse, Transport, TransportError, TransportHandle};

// ---------------------------------------------------------------------------
// DataListener
// ---------------------------------------------------------------------------

/// Receives the outcome of one submitted request.
///
/// Methods consume the listener, so per submission at most one of them runs,
/// at most once. That property is enforced by the compiler, not by
/// convention.
pub trait DataListener: Send + 'static {
    /// Called once the payload parsed successfully. The transaction carries
    /// the parsed JSON in its response.
    fn on_success(self: Box<Self>, transaction: DataTransaction);

    /// Called once the exchange failed. The transaction carries a
    /// classified [`FailureMessage`] in its response.
    fn on_failure(self: Box<Self>, transaction: DataTransaction);
}

// ---------------------------------------------------------------------------
// DataTransceiver
// ---------------------------------------------------------------------------

/// Accepts requests and drives their exchanges to exactly one callback.
pub struct DataTransceiver {
    transport: Arc<dyn Transport>,
    runtime: Handle,
}

impl DataTransceiver {
    /// Creates a transceiver that runs exchanges on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; use
    /// [`with_runtime`](Self::with_runtime) from non-async contexts.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_runtime(transport, Handle::current())
    }

    /// Creates a transceiver that runs exchanges on `runtime`.
    #[must_use]
    pub fn with_runtime(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        Self { transport, runtime }
    }

    /// Submits a request for execution.
    ///
    /// Already-cancelled requests are skipped silently. For everything else
    /// the listener hears exactly one callback once the exchange settles:
    /// `on_success` with the parsed payload, or `on_failure` with a
    /// classified failure. Submitting the same request twice is a contract
    /// violation.
    pub fn submit<L: DataListener>(&self, request: Arc<DataRequest>, listener: L) {
        if request.is_cancelled() {
            debug!(path = %request.path(), "skipping submission, request already cancelled");
            return;
        }

        let handle = TransportHandle::new();
        request.attach_transport_handle(handle.clone());

        let transaction = DataTransaction::new(Arc::clone(&request));
        let transport = Arc::clone(&self.transport);
        let listener: Box<dyn DataListener> = Box::new(listener);

        debug!(method = %request.method(), path = %request.path(), "submitting request");
        self.runtime.spawn(async move {
            let outcome = tokio::select! {
                () = handle.aborted() => Err(TransportError::Aborted),
                outcome = transport.perform(&request) => outcome,
            };
            deliver(transaction, outcome, listener);
        });
    }
}

impl fmt::Debug for DataTransceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTransceiver").finish_non_exhaustive()
    }
}

/// Converts a raw outcome into a populated transaction and routes exactly
/// one listener callback.
///
/// Every successful payload goes through the JSON parse, even when nobody
/// downstream wants a result: an empty or malformed body is a service
/// response error, not a success.
fn deliver(
    mut transaction: DataTransaction,
    outcome: Result<RawResponse, TransportError>,
    listener: Box<dyn DataListener>,
) {
    let parsed = outcome.map_err(TransceiveError::from).and_then(|raw| {
        serde_json::from_slice::<Value>(&raw.body).map_err(TransceiveError::from)
    });

    match parsed {
        Ok(json) => {
            debug!(path = %transaction.request().path(), "delivering success");
            transaction.set_json(json);
            listener.on_success(transaction);
        }
        Err(error) => {
            debug!(path = %transaction.request().path(), %error, "delivering failure");
            transaction.set_failure(FailureMessage::classify(error));
            contract::ensure(
                transaction.response().failure().is_some(),
                "failure delivered without a message",
            );
            listener.on_failure(transaction);
        }
    }
}

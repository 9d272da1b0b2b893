//! Generic executor for HTTP service calls.
//!
//! A [`ServiceCall`] describes one endpoint; a [`ServiceOperation`] wraps it
//! with the execution lifecycle: URL composition, request construction,
//! submission, cancellation, and decoding the payload into the declared
//! result type.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use ferry_core::contract;
use ferry_core::models::{DataRequest, DataTransaction};
use ferry_core::transceiver::DataListener;

use crate::context::Core;
use crate::operations::operation::{NoResult, Operation, OperationListener};

// ---------------------------------------------------------------------------
// ServiceCall
// ---------------------------------------------------------------------------

/// One service endpoint: where it lives and how to build its request.
///
/// Implement this per call your service exposes and wrap it in a
/// [`ServiceOperation`] to execute it. The hooks mirror the request
/// lifecycle: [`base_url`](Self::base_url) and [`endpoint`](Self::endpoint)
/// compose the URL, [`update_headers`](Self::update_headers) and
/// [`update_params`](Self::update_params) contribute ambient values, and
/// [`build_request`](Self::build_request) assembles the final request.
pub trait ServiceCall: Send + Sync + 'static {
    /// Path fragment appended to the base URL, e.g. `/questions`.
    fn endpoint(&self) -> String;

    /// Builds the request for `url`. The maps have already passed through
    /// the update hooks.
    fn build_request(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        params: HashMap<String, String>,
    ) -> DataRequest;

    /// Contributes headers sent with every request of this call.
    fn update_headers(&self, _headers: &mut HashMap<String, String>) {}

    /// Contributes query parameters sent with every request of this call.
    fn update_params(&self, _params: &mut HashMap<String, String>) {}

    /// Pins this call to a base URL of its own. The default `None` defers
    /// to the [`Core`](crate::Core) configuration.
    fn base_url(&self) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// ServiceOperation
// ---------------------------------------------------------------------------

const PHASE_IDLE: u8 = 0;
const PHASE_EXECUTING: u8 = 1;
const PHASE_CANCELLED: u8 = 2;

/// Execution lifecycle shared between an operation and its delivery
/// adapter.
///
/// Phase machine: Idle -> Executing -> back to Idle when the outcome is
/// delivered, with a Cancelled detour that suppresses delivery. Every
/// transition is a compare-and-swap, so racing execute, cancel, and
/// delivery calls settle deterministically.
#[derive(Debug)]
struct ExecutionState {
    phase: AtomicU8,
    in_flight: Mutex<Option<Arc<DataRequest>>>,
}

/// How a successful payload becomes the typed result.
enum ResultKind<T> {
    /// Decode the payload into `T`.
    Json(fn(Value) -> Result<T, serde_json::Error>),
    /// Ignore the payload and produce the sentinel.
    Empty(fn() -> T),
}

impl<T> Clone for ResultKind<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResultKind<T> {}

/// Executes a [`ServiceCall`] and decodes its JSON payload into `T`.
///
/// One instance runs at most one execution at a time: `execute` during a
/// running execution is ignored, and `cancel` succeeds only while one is
/// running. Once an execution settles the instance is reusable.
pub struct ServiceOperation<T> {
    core: Core,
    call: Arc<dyn ServiceCall>,
    result: ResultKind<T>,
    state: Arc<ExecutionState>,
}

impl<T: DeserializeOwned + Send + 'static> ServiceOperation<T> {
    /// Builds an operation that decodes successful payloads into `T`.
    ///
    /// A payload that does not decode into `T` is a contract violation:
    /// the call declared a result type its service does not return.
    #[must_use]
    pub fn new(core: Core, call: impl ServiceCall) -> Self {
        Self::with_result_kind(core, Arc::new(call), ResultKind::Json(serde_json::from_value::<T>))
    }
}

impl ServiceOperation<NoResult> {
    /// Builds an operation that expects no payload model.
    ///
    /// The response body still has to be valid JSON, it is just never
    /// decoded further.
    #[must_use]
    pub fn without_result(core: Core, call: impl ServiceCall) -> Self {
        Self::with_result_kind(core, Arc::new(call), ResultKind::Empty(|| NoResult))
    }
}

impl<T> ServiceOperation<T> {
    fn with_result_kind(core: Core, call: Arc<dyn ServiceCall>, result: ResultKind<T>) -> Self {
        Self {
            core,
            call,
            result,
            state: Arc::new(ExecutionState {
                phase: AtomicU8::new(PHASE_IDLE),
                in_flight: Mutex::new(None),
            }),
        }
    }

    fn generate_url(&self) -> String {
        let base = self
            .call
            .base_url()
            .unwrap_or_else(|| self.core.base_url().to_owned());
        contract::ensure_non_empty(
            &base,
            "no base url: provide one in CoreConfig or override ServiceCall::base_url",
        );
        let endpoint = self.call.endpoint();
        contract::ensure_non_empty(&endpoint, "service endpoint must not be empty");
        format!("{base}{endpoint}")
    }
}

impl<T: Send + 'static> Operation<T> for ServiceOperation<T> {
    fn execute(&self, listener: Box<dyn OperationListener<T>>) {
        let endpoint = self.call.endpoint();
        debug!(endpoint = %endpoint, "entering execute");

        if self
            .state
            .phase
            .compare_exchange(PHASE_IDLE, PHASE_EXECUTING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(endpoint = %endpoint, "ignoring execute, operation already in execution");
            return;
        }

        let url = self.generate_url();
        debug!(url = %url, "resolved service url");

        let mut headers = HashMap::new();
        let mut params = HashMap::new();
        self.call.update_headers(&mut headers);
        self.call.update_params(&mut params);

        let request = Arc::new(self.call.build_request(&url, headers, params));
        *self.state.in_flight.lock() = Some(Arc::clone(&request));

        let callback = OperationCallback {
            state: Arc::clone(&self.state),
            result: self.result,
            listener,
            endpoint,
        };
        self.core.transceiver().submit(request, callback);
    }

    fn cancel(&self) -> bool {
        if self
            .state
            .phase
            .compare_exchange(
                PHASE_EXECUTING,
                PHASE_CANCELLED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            let request = self.state.in_flight.lock().clone();
            if let Some(request) = request {
                request.cancel();
            }
            debug!(endpoint = %self.call.endpoint(), "operation cancelled");
            true
        } else {
            if self.state.phase.load(Ordering::SeqCst) == PHASE_CANCELLED {
                debug!(endpoint = %self.call.endpoint(), "cancel ignored, operation already cancelled");
            } else {
                debug!(endpoint = %self.call.endpoint(), "cancel ignored, operation not in execution");
            }
            false
        }
    }
}

// ---------------------------------------------------------------------------
// OperationCallback
// ---------------------------------------------------------------------------

/// Delivery adapter bridging transceiver callbacks back to the operation's
/// listener.
///
/// The in-flight slot is cleared before the phase swap, so whichever of
/// cancel and delivery runs second observes the other's write: a cancelled
/// execution never reports, and a reported execution was never cancelled.
struct OperationCallback<T> {
    state: Arc<ExecutionState>,
    result: ResultKind<T>,
    listener: Box<dyn OperationListener<T>>,
    endpoint: String,
}

impl<T> OperationCallback<T> {
    /// Ends the execution. Returns true when the outcome should be
    /// delivered, false when the execution was cancelled. Either way the
    /// phase returns to idle and the operation is reusable.
    fn finish(&self) -> bool {
        self.state.in_flight.lock().take();
        let previous = self.state.phase.swap(PHASE_IDLE, Ordering::SeqCst);
        if previous == PHASE_EXECUTING {
            true
        } else {
            debug!(endpoint = %self.endpoint, "ignoring delivery, operation cancelled");
            false
        }
    }
}

impl<T: Send + 'static> DataListener for OperationCallback<T> {
    fn on_success(self: Box<Self>, transaction: DataTransaction) {
        if !self.finish() {
            return;
        }
        let this = *self;
        let json = contract::required(
            transaction.into_response().into_json(),
            "success delivered without a payload",
        );
        let result = match this.result {
            ResultKind::Json(decode) => decode_or_violate(decode, json),
            ResultKind::Empty(make) => {
                debug!(endpoint = %this.endpoint, "dropping payload, operation expects no result");
                make()
            }
        };
        debug!(endpoint = %this.endpoint, "delivering success");
        this.listener.on_success(result);
    }

    fn on_failure(self: Box<Self>, transaction: DataTransaction) {
        if !self.finish() {
            return;
        }
        let this = *self;
        let failure = contract::required(
            transaction.into_response().into_failure(),
            "failure delivered without a message",
        );
        debug!(endpoint = %this.endpoint, failure = %failure, "delivering failure");
        this.listener.on_failure(failure);
    }
}

/// Decodes the payload, treating failure as a programming error: the call
/// declared a result type its service does not actually return.
fn decode_or_violate<T>(decode: fn(Value) -> Result<T, serde_json::Error>, json: Value) -> T {
    match decode(json) {
        Ok(result) => result,
        Err(error) => contract::violation(&format!(
            "response payload does not match the declared result type: {error}"
        )),
    }
}

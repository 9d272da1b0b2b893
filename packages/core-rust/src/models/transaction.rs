//! Request/response pairing for one exchange.

use std::sync::Arc;

use serde_json::Value;

use crate::contract;
use crate::models::{DataRequest, FailureMessage};

// ---------------------------------------------------------------------------
// DataTransaction
// ---------------------------------------------------------------------------

/// One request together with the response that eventually answers it.
///
/// The transceiver builds a transaction at submission time, populates the
/// response exactly once, and moves the whole transaction into the listener
/// callback. The move is the single-delivery guarantee: no shared copy is
/// left behind to consume twice.
#[derive(Debug)]
pub struct DataTransaction {
    request: Arc<DataRequest>,
    response: DataResponse,
}

impl DataTransaction {
    /// Starts a transaction for `request` with an empty response.
    #[must_use]
    pub fn new(request: Arc<DataRequest>) -> Self {
        Self {
            request,
            response: DataResponse::default(),
        }
    }

    #[must_use]
    pub fn request(&self) -> &DataRequest {
        &self.request
    }

    #[must_use]
    pub fn response(&self) -> &DataResponse {
        &self.response
    }

    /// Records the parsed payload. The response must still be empty.
    pub fn set_json(&mut self, json: Value) {
        self.response.set_json(json);
    }

    /// Records the failure. The response must still be empty.
    pub fn set_failure(&mut self, failure: FailureMessage) {
        self.response.set_failure(failure);
    }

    /// Consumes the transaction, yielding its response.
    #[must_use]
    pub fn into_response(self) -> DataResponse {
        self.response
    }
}

// ---------------------------------------------------------------------------
// DataResponse
// ---------------------------------------------------------------------------

/// Outcome of one exchange: a parsed payload or a failure, never both.
///
/// Populating an already-populated response is a contract violation; the
/// pipeline settles each exchange exactly once.
#[derive(Debug, Default)]
pub struct DataResponse {
    json: Option<Value>,
    failure: Option<FailureMessage>,
}

impl DataResponse {
    /// Parsed payload, present on the success path.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Failure, present on the failure path.
    #[must_use]
    pub fn failure(&self) -> Option<&FailureMessage> {
        self.failure.as_ref()
    }

    /// True once either outcome has been recorded.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.json.is_some() || self.failure.is_some()
    }

    /// Consumes the response, yielding the payload.
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        self.json
    }

    /// Consumes the response, yielding the failure.
    #[must_use]
    pub fn into_failure(self) -> Option<FailureMessage> {
        self.failure
    }

    fn set_json(&mut self, json: Value) {
        contract::require(!self.is_populated(), "response populated twice");
        self.json = Some(json);
    }

    fn set_failure(&mut self, failure: FailureMessage) {
        contract::require(!self.is_populated(), "response populated twice");
        self.failure = Some(failure);
    }
}

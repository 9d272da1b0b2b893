//! Declarative description of one HTTP call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use serde_json::Value;
use tracing::{debug, warn};

use crate::contract;
use crate::models::RequestMethod;
use crate::transport::TransportHandle;

/// Everything a transport needs to run one HTTP call.
///
/// Requests are immutable once built, apart from two pieces of lifecycle
/// state: the cancelled flag and the abort handle the transceiver attaches
/// at submission time. Both are interior so a request can be shared between
/// the submitting side and the cancelling side.
#[derive(Debug)]
pub struct DataRequest {
    method: RequestMethod,
    path: String,
    headers: HashMap<String, String>,
    params: HashMap<String, String>,
    body: Option<Value>,
    cancelled: AtomicBool,
    transport_handle: OnceLock<TransportHandle>,
}

impl DataRequest {
    /// Builds a body-less request.
    ///
    /// `method` must be a verb without a body (`Get` or `Delete`) and
    /// `path` must be non-empty; anything else is a contract violation.
    #[must_use]
    pub fn simple(
        method: RequestMethod,
        path: impl Into<String>,
        headers: HashMap<String, String>,
        params: HashMap<String, String>,
    ) -> Self {
        contract::require(
            !method.has_body(),
            "simple request built with a body-carrying method",
        );
        Self::build(method, path.into(), headers, params, None)
    }

    /// Builds a request carrying a JSON body.
    ///
    /// `method` must be a body-carrying verb (`Post` or `Put`), `path` must
    /// be non-empty, and `body` must be a JSON object; anything else is a
    /// contract violation.
    #[must_use]
    pub fn json(
        method: RequestMethod,
        path: impl Into<String>,
        headers: HashMap<String, String>,
        params: HashMap<String, String>,
        body: Value,
    ) -> Self {
        contract::require(
            method.has_body(),
            "json request built with a body-less method",
        );
        contract::require(body.is_object(), "request body must be a JSON object");
        Self::build(method, path.into(), headers, params, Some(body))
    }

    fn build(
        method: RequestMethod,
        path: String,
        headers: HashMap<String, String>,
        params: HashMap<String, String>,
        body: Option<Value>,
    ) -> Self {
        contract::require_non_empty(&path, "request path must not be empty");
        Self {
            method,
            path,
            headers,
            params,
            body,
            cancelled: AtomicBool::new(false),
            transport_handle: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// JSON body, present iff the verb carries one.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.method.has_body()
    }

    /// Body serialized for the wire, `None` (with a log line) when the
    /// request has no body.
    #[must_use]
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        match &self.body {
            Some(body) => Some(body.to_string().into_bytes()),
            None => {
                warn!(path = %self.path, "body requested for a body-less request");
                None
            }
        }
    }

    /// Flags the request as cancelled and aborts the in-flight exchange,
    /// if one is running.
    ///
    /// Cancelling before submission makes the transceiver skip the request
    /// entirely. Cancelling mid-flight is best-effort: an exchange that
    /// already settled still delivers.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.transport_handle.get() {
            debug!(path = %self.path, "aborting in-flight exchange");
            handle.abort();
        }
    }

    /// True once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wires the abort handle for the in-flight exchange. The transceiver
    /// calls this exactly once per request at submission time; a second
    /// submission of the same request is a contract violation.
    pub(crate) fn attach_transport_handle(&self, handle: TransportHandle) {
        let probe = handle.clone();
        contract::require(
            self.transport_handle.set(handle).is_ok(),
            "request submitted more than once",
        );
        // cancel() may have raced ahead of attachment; abort now so the
        // exchange never outlives the cancellation.
        if self.is_cancelled() {
            probe.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn header_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn simple_get_round_trips_fields() {
        let request = DataRequest::simple(
            RequestMethod::Get,
            "https://svc.test/questions",
            header_map(&[("X-Session", "s-1")]),
            header_map(&[("page", "2")]),
        );

        assert_eq!(request.method(), RequestMethod::Get);
        assert_eq!(request.path(), "https://svc.test/questions");
        assert_eq!(request.headers().get("X-Session").unwrap(), "s-1");
        assert_eq!(request.params().get("page").unwrap(), "2");
        assert!(!request.has_body());
        assert!(request.body().is_none());
        assert!(!request.is_cancelled());
    }

    #[test]
    fn json_post_keeps_its_body() {
        let body = serde_json::json!({"answer": 42});
        let request = DataRequest::json(
            RequestMethod::Post,
            "https://svc.test/answers",
            HashMap::new(),
            HashMap::new(),
            body.clone(),
        );

        assert!(request.has_body());
        assert_eq!(request.body(), Some(&body));

        let bytes = request.body_bytes().unwrap();
        let round_tripped: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(round_tripped, body);
    }

    #[test]
    fn body_bytes_is_none_for_simple_requests() {
        let request = DataRequest::simple(
            RequestMethod::Delete,
            "https://svc.test/sessions/1",
            HashMap::new(),
            HashMap::new(),
        );
        assert!(request.body_bytes().is_none());
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn simple_rejects_body_carrying_method() {
        let _ = DataRequest::simple(
            RequestMethod::Post,
            "https://svc.test/answers",
            HashMap::new(),
            HashMap::new(),
        );
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn json_rejects_body_less_method() {
        let _ = DataRequest::json(
            RequestMethod::Get,
            "https://svc.test/questions",
            HashMap::new(),
            HashMap::new(),
            serde_json::json!({}),
        );
    }

    #[test]
    #[should_panic(expected = "contract violation: request body must be a JSON object")]
    fn json_rejects_non_object_body() {
        let _ = DataRequest::json(
            RequestMethod::Post,
            "https://svc.test/answers",
            HashMap::new(),
            HashMap::new(),
            serde_json::json!([1, 2, 3]),
        );
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn empty_path_is_rejected() {
        let _ = DataRequest::simple(RequestMethod::Get, "", HashMap::new(), HashMap::new());
    }

    #[test]
    fn cancel_flips_the_flag() {
        let request =
            DataRequest::simple(RequestMethod::Get, "/x", HashMap::new(), HashMap::new());
        request.cancel();
        assert!(request.is_cancelled());
    }

    #[test]
    fn cancel_aborts_an_attached_handle() {
        let request =
            DataRequest::simple(RequestMethod::Get, "/x", HashMap::new(), HashMap::new());
        let handle = TransportHandle::new();
        request.attach_transport_handle(handle.clone());

        request.cancel();

        assert!(handle.is_aborted());
    }

    #[test]
    fn cancel_before_attachment_still_aborts_the_handle() {
        let request =
            DataRequest::simple(RequestMethod::Get, "/x", HashMap::new(), HashMap::new());
        request.cancel();

        let handle = TransportHandle::new();
        request.attach_transport_handle(handle.clone());

        assert!(handle.is_aborted());
    }

    #[test]
    #[should_panic(expected = "contract violation: request submitted more than once")]
    fn second_attachment_is_a_contract_violation() {
        let request =
            DataRequest::simple(RequestMethod::Get, "/x", HashMap::new(), HashMap::new());
        request.attach_transport_handle(TransportHandle::new());
        request.attach_transport_handle(TransportHandle::new());
    }

    proptest! {
        #[test]
        fn construction_preserves_fields(
            path in "[a-z0-9/._-]{1,40}",
            params in proptest::collection::hash_map("[a-z]{1,8}", "[a-z0-9]{0,12}", 0..4),
        ) {
            let request = DataRequest::simple(
                RequestMethod::Get,
                path.clone(),
                HashMap::new(),
                params.clone(),
            );
            prop_assert_eq!(request.path(), path.as_str());
            prop_assert_eq!(request.params(), &params);
            prop_assert!(!request.has_body());
        }
    }
}

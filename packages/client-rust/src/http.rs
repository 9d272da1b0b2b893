//! Bundled [`Transport`] on top of reqwest.
//!
//! Turns a [`DataRequest`] into a real HTTP call: params become query
//! parameters, body-carrying requests get the JSON content type, and every
//! request carries the configured user agent. Failures map onto
//! [`TransportError`] so the classifier upstream stays total.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};

use ferry_core::models::{DataRequest, RequestMethod};
use ferry_core::transport::{RawResponse, Transport, TransportError};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// ---------------------------------------------------------------------------
// HttpTransportConfig
// ---------------------------------------------------------------------------

/// Tuning for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Value sent as the `User-agent` header of every request.
    pub user_agent: String,
    /// Deadline for one whole exchange, connect through body.
    pub request_timeout: Duration,
    /// Deadline for establishing the connection.
    pub connect_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("ferry/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// [`Transport`] backed by a shared reqwest client.
///
/// Cloning is cheap and shares the client's connection pool. Cancellation
/// needs no support here: the transceiver drops the in-flight future, which
/// aborts the underlying request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpTransport {
    /// Builds a transport with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying client cannot be constructed.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Builds a transport from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying client cannot be constructed.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|error| TransportError::Other(error.into()))?;
        Ok(Self {
            client,
            user_agent: config.user_agent,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: &DataRequest) -> Result<RawResponse, TransportError> {
        let method = match request.method() {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, request.path())
            .headers(build_headers(request, &self.user_agent)?);
        if !request.params().is_empty() {
            builder = builder.query(request.params());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let headers = copy_headers(response.headers());
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(RawResponse { body, headers })
    }
}

/// Assembles the outgoing header map. Request-level headers go in first;
/// the user agent and the JSON content type are SDK-owned and win on
/// collision.
fn build_headers(request: &DataRequest, user_agent: &str) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    for (name, value) in request.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|error| TransportError::Other(error.into()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|error| TransportError::Other(error.into()))?;
        headers.insert(name, value);
    }
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent).map_err(|error| TransportError::Other(error.into()))?,
    );
    if request.has_body() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }
    Ok(headers)
}

/// Maps a reqwest failure onto the transport error surface. Timeouts and
/// connection failures get their dedicated variants so they classify as
/// network errors; everything else stays opaque.
fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connectivity(error.into())
    } else {
        TransportError::Other(error.into())
    }
}

fn copy_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_owned(), value.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const OK_JSON: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"ok\":true}";
    const SERVER_ERROR: &str =
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    /// True once `received` holds a complete request, headers and body.
    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        body.len() >= content_length
    }

    /// Serves exactly one canned HTTP/1.1 response; the task resolves to
    /// the raw request it received.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buffer = [0_u8; 1024];
            loop {
                let read = socket.read(&mut buffer).await.unwrap();
                received.extend_from_slice(&buffer[..read]);
                if read == 0 || request_complete(&received) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn get(path: String) -> DataRequest {
        DataRequest::simple(RequestMethod::Get, path, HashMap::new(), HashMap::new())
    }

    #[tokio::test]
    async fn get_success_returns_the_raw_payload() {
        let (base, server) = serve_once(OK_JSON).await;
        let transport = HttpTransport::new().unwrap();

        let response = transport
            .perform(&get(format!("{base}/questions")))
            .await
            .unwrap();

        assert_eq!(&response.body[..], b"{\"ok\":true}");
        assert_eq!(
            response.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        let received = server.await.unwrap();
        assert!(received.starts_with("GET /questions HTTP/1.1"));
    }

    #[tokio::test]
    async fn post_sends_body_content_type_and_user_agent() {
        let (base, server) = serve_once(OK_JSON).await;
        let transport = HttpTransport::new().unwrap();
        let request = DataRequest::json(
            RequestMethod::Post,
            format!("{base}/answers"),
            HashMap::new(),
            HashMap::new(),
            serde_json::json!({"a": 1}),
        );

        transport.perform(&request).await.unwrap();

        let received = server.await.unwrap();
        let lower = received.to_lowercase();
        assert!(received.starts_with("POST /answers HTTP/1.1"));
        assert!(lower.contains("content-type: application/json; charset=utf-8"));
        assert!(lower.contains(&format!("user-agent: ferry/{}", env!("CARGO_PKG_VERSION"))));
        assert!(received.ends_with("{\"a\":1}"));
    }

    #[tokio::test]
    async fn params_become_query_parameters() {
        let (base, server) = serve_once(OK_JSON).await;
        let transport = HttpTransport::new().unwrap();
        let mut params = HashMap::new();
        params.insert("page".to_owned(), "2".to_owned());
        let request = DataRequest::simple(
            RequestMethod::Get,
            format!("{base}/questions"),
            HashMap::new(),
            params,
        );

        transport.perform(&request).await.unwrap();

        let received = server.await.unwrap();
        assert!(received.starts_with("GET /questions?page=2 HTTP/1.1"));
    }

    #[tokio::test]
    async fn request_headers_are_forwarded() {
        let (base, server) = serve_once(OK_JSON).await;
        let transport = HttpTransport::new().unwrap();
        let mut headers = HashMap::new();
        headers.insert("X-Session".to_owned(), "s-1".to_owned());
        let request = DataRequest::simple(
            RequestMethod::Get,
            format!("{base}/questions"),
            headers,
            HashMap::new(),
        );

        transport.perform(&request).await.unwrap();

        let received = server.await.unwrap();
        assert!(received.to_lowercase().contains("x-session: s-1"));
    }

    #[tokio::test]
    async fn configured_user_agent_is_sent() {
        let (base, server) = serve_once(OK_JSON).await;
        let transport = HttpTransport::with_config(HttpTransportConfig {
            user_agent: "probe/9.9".to_owned(),
            ..HttpTransportConfig::default()
        })
        .unwrap();

        transport.perform(&get(format!("{base}/q"))).await.unwrap();

        let received = server.await.unwrap();
        assert!(received.to_lowercase().contains("user-agent: probe/9.9"));
    }

    #[tokio::test]
    async fn error_status_maps_to_status_variant() {
        let (base, _server) = serve_once(SERVER_ERROR).await;
        let transport = HttpTransport::new().unwrap();

        let error = transport
            .perform(&get(format!("{base}/broken")))
            .await
            .unwrap_err();

        assert!(matches!(error, TransportError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn connection_refused_maps_to_connectivity() {
        let transport = HttpTransport::new().unwrap();

        // Port 9 (discard) is closed in any sane test environment.
        let error = transport
            .perform(&get("http://127.0.0.1:9/".to_owned()))
            .await
            .unwrap_err();

        assert!(matches!(error, TransportError::Connectivity(_)));
    }

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = [0_u8; 1024];
            let _ = socket.read(&mut buffer).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
                .await;
        });
        let transport = HttpTransport::with_config(HttpTransportConfig {
            request_timeout: Duration::from_millis(200),
            ..HttpTransportConfig::default()
        })
        .unwrap();

        let error = transport
            .perform(&get(format!("http://{addr}/slow")))
            .await
            .unwrap_err();

        assert!(matches!(error, TransportError::Timeout));
    }
}

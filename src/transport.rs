//! HTTP transport: one POST cycle per call, with timeout enforcement,
//! an in-flight concurrency ceiling, and typed failure translation.

use crate::error::TimeoutPhase;
use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// The outgoing request as the transport sees it: the JSON envelope plus
/// per-request headers.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// Headers to send with the request.
    pub headers: HeaderMap,
    /// The serialized GraphQL envelope.
    pub body: Value,
}

/// The raw response before decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body text.
    pub body: String,
}

/// Timeouts and the concurrency ceiling for a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Maximum time to establish a connection.
    pub connect_timeout: Option<Duration>,
    /// Maximum idle time while reading the response body.
    pub read_timeout: Option<Duration>,
    /// Deadline for the whole request.
    pub request_timeout: Option<Duration>,
    /// Maximum number of requests in flight at once.
    pub max_in_flight: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            request_timeout: None,
            max_in_flight: 64,
        }
    }
}

/// Executes single HTTP request/response cycles against one endpoint.
///
/// The permit pool is a resource-protection throttle: callers queue for a
/// slot when all permits are taken. It is distinct from the rate limiter,
/// which is a non-blocking policy decision made before the transport is
/// reached.
///
/// `close()` is idempotent; after close, `execute` fails fast with
/// [`Error::TransportClosed`] instead of attempting I/O.
pub struct Transport {
    http: reqwest::Client,
    endpoint: Url,
    request_timeout: Option<Duration>,
    permits: Semaphore,
    closed: AtomicBool,
}

impl Transport {
    /// Builds a transport for `endpoint` with the given timeouts and
    /// concurrency ceiling.
    ///
    /// # Errors
    ///
    /// Fails if the ceiling is zero or the underlying HTTP client cannot
    /// be constructed.
    pub fn new(endpoint: Url, config: TransportConfig) -> Result<Self> {
        if config.max_in_flight == 0 {
            return Err(Error::ConfigurationError(
                "max in-flight requests must be at least 1".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.read_timeout {
            builder = builder.read_timeout(timeout);
        }
        let http = builder.build().map_err(|err| {
            Error::ConfigurationError(format!("failed to build HTTP client: {err}"))
        })?;

        Ok(Self {
            http,
            endpoint,
            request_timeout: config.request_timeout,
            permits: Semaphore::new(config.max_in_flight),
            closed: AtomicBool::new(false),
        })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Executes one POST cycle.
    ///
    /// Blocks (asynchronously) for an in-flight permit, sends the request,
    /// and reads the full body. Transport-layer failures are translated
    /// into connection, timeout (phase-tagged), or generic network errors.
    pub async fn execute(&self, request: WireRequest) -> Result<RawResponse> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::TransportClosed);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::TransportClosed)?;

        tracing::debug!(url = %self.endpoint, "dispatching request");

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .headers(request.headers)
            .json(&request.body);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|err| self.classify(err))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|err| self.classify(err))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// Closes the transport. Idempotent; pending and subsequent `execute`
    /// calls fail with [`Error::TransportClosed`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.permits.close();
        }
    }

    /// Returns `true` once the transport has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            let phase = if err.is_connect() {
                TimeoutPhase::Connect
            } else if err.is_body() {
                TimeoutPhase::Read
            } else {
                TimeoutPhase::Request
            };
            return Error::Timeout { phase };
        }

        if err.is_connect() {
            return Error::Connection {
                host: self.endpoint.host_str().map(str::to_string),
                port: self.endpoint.port_or_known_default(),
                source: err,
            };
        }

        Error::Network(err)
    }
}

//! GraphQL client with retry logic, rate limiting, and rich error handling.
//!
//! The [`Client`] type is the main entry point for executing operations.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::operation::{Operation, PreparedOperation};
use crate::rate_limit::{RateLimitInfo, RateLimiter};
use crate::response::{self, Response};
use crate::retry::{RetryListener, RetryPolicy};
use crate::scalar::ScalarRegistry;
use crate::transport::{RawResponse, Transport, TransportConfig, WireRequest};
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A GraphQL client for executing operations with retry logic, rate
/// limiting, and rich error handling.
///
/// The client is designed to be reused: it holds a connection pool, the
/// transport permit pool, and the rate-limiter bucket, all safe to share
/// across concurrent tasks. Cloning is cheap.
///
/// # Examples
///
/// ```no_run
/// use graphite_client::{BackoffStrategy, Client, Operation, RetryPolicy};
/// use serde::Deserialize;
/// use std::time::Duration;
///
/// #[derive(Deserialize)]
/// struct UserData {
///     user: User,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     id: String,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), graphite_client::Error> {
/// let backoff = BackoffStrategy::exponential(
///     Duration::from_millis(100),
///     Duration::from_secs(10),
///     2.0,
/// )?
/// .with_jitter(0.5)?;
///
/// let client = Client::builder()
///     .endpoint("https://api.example.com/graphql")?
///     .default_header("authorization", "Bearer token")?
///     .request_timeout(Duration::from_secs(30))
///     .retry_policy(RetryPolicy::transient(3, backoff))
///     .build()?;
///
/// let op = Operation::new("GetUser", "query GetUser($id: ID!) { user(id: $id) { id name } }")
///     .variable("id", "42")?;
///
/// let response = client.execute::<UserData>(&op).await?;
/// let data = response.into_data()?;
/// println!("user: {}", data.user.name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

struct ClientInner {
    transport: Transport,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    rate_limiter: Option<RateLimiter>,
    scalars: ScalarRegistry,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
    retry_listener: Option<Box<dyn RetryListener>>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The scalar registry this client was configured with.
    ///
    /// Generated code uses it to coerce custom scalar values.
    pub fn scalars(&self) -> &ScalarRegistry {
        &self.inner.scalars
    }

    /// Closes the underlying transport. Idempotent; subsequent `execute`
    /// calls fail fast.
    pub fn close(&self) {
        self.inner.transport.close();
    }

    /// Executes one GraphQL operation and decodes the response.
    ///
    /// The whole pipeline runs within this call: serialize, request
    /// interceptors, rate-limit admission, transport dispatch with the
    /// retry loop (including backoff sleeps), response interceptors, and
    /// decoding. Listener and interceptor callbacks run on the calling
    /// task.
    ///
    /// A response carrying GraphQL errors is still `Ok`: partial success
    /// is returned as-is, and [`Response::into_data`] decides whether to
    /// treat errors as fatal.
    pub async fn execute<T>(&self, operation: &Operation) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        let mut request = WireRequest {
            headers: self.inner.default_headers.clone(),
            body: operation.to_envelope(),
        };

        for interceptor in &self.inner.request_interceptors {
            request = interceptor.intercept(request)?;
        }

        // Local admission decision, not a transient network condition:
        // denial fails immediately and is never routed through retry.
        if let Some(limiter) = &self.inner.rate_limiter {
            if !limiter.try_acquire() {
                tracing::warn!(
                    operation = operation.name(),
                    "rate limiter denied admission"
                );
                return Err(Error::RateLimited {
                    info: RateLimitInfo::default(),
                });
            }
        }

        let mut raw = self.execute_with_retries(operation, &request).await?;

        for interceptor in &self.inner.response_interceptors {
            raw = interceptor.intercept(raw)?;
        }

        response::decode(&raw)
    }

    /// Executes a generated operation with the given variables.
    pub async fn execute_prepared<O>(
        &self,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Response<O::Response>>
    where
        O: PreparedOperation,
    {
        let mut operation = Operation::new(O::NAME, O::DOCUMENT);
        for (name, value) in variables {
            operation = operation.variable_value(name, value);
        }
        self.execute(&operation).await
    }

    /// The transport/retry portion of the pipeline: dispatch, classify the
    /// HTTP status, and loop per the retry policy.
    async fn execute_with_retries(
        &self,
        operation: &Operation,
        request: &WireRequest,
    ) -> Result<RawResponse> {
        let mut retries: u32 = 0;

        loop {
            let result = match self.inner.transport.execute(request.clone()).await {
                Ok(raw) => classify_status(raw),
                Err(err) => Err(err),
            };

            match result {
                Ok(raw) => {
                    if retries > 0 {
                        tracing::info!(
                            operation = operation.name(),
                            attempts = retries + 1,
                            "request succeeded after retries"
                        );
                        if let Some(listener) = &self.inner.retry_listener {
                            listener.on_success(retries + 1);
                        }
                    }
                    return Ok(raw);
                }
                Err(error) => {
                    let attempt = retries + 1;
                    tracing::warn!(
                        error = %error,
                        attempt,
                        operation = operation.name(),
                        "request attempt failed"
                    );

                    if !self.inner.retry_policy.should_retry(&error, attempt) {
                        if retries > 0 {
                            if let Some(listener) = &self.inner.retry_listener {
                                listener.on_exhausted(retries, &error);
                            }
                        }
                        // The original last failure propagates unchanged.
                        return Err(error);
                    }

                    let delay = self.inner.retry_policy.delay_for_attempt(attempt);
                    if let Some(listener) = &self.inner.retry_listener {
                        listener.on_retry(attempt, delay, &error);
                    }
                    tracing::info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt,
                        operation = operation.name(),
                        "retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
            }
        }
    }
}

/// Turns non-2xx statuses into typed failures: 429 becomes a rate-limit
/// error with parsed header hints, other statuses an HTTP error.
fn classify_status(raw: RawResponse) -> Result<RawResponse> {
    if raw.status.is_success() {
        return Ok(raw);
    }

    let info = RateLimitInfo::from_headers(&raw.headers);
    if raw.status == http::StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited { info });
    }

    Err(Error::Http {
        status: raw.status,
        raw_response: raw.body,
        headers: raw.headers,
        rate_limit_info: if info.is_rate_limited() {
            Some(info)
        } else {
            None
        },
    })
}

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    endpoint: Option<Url>,
    default_headers: HeaderMap,
    transport_config: TransportConfig,
    retry_policy: RetryPolicy,
    rate_limiter: Option<RateLimiter>,
    scalars: ScalarRegistry,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
    retry_listener: Option<Box<dyn RetryListener>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings: no retry, no
    /// rate limiter, default scalar registry, 64 in-flight requests.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            default_headers: HeaderMap::new(),
            transport_config: TransportConfig::default(),
            retry_policy: RetryPolicy::disabled(),
            rate_limiter: None,
            scalars: ScalarRegistry::with_defaults(),
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            retry_listener: None,
        }
    }

    /// Sets the GraphQL endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn endpoint(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.endpoint = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("invalid header value: {e}")))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the connection-establishment timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.connect_timeout = Some(timeout);
        self
    }

    /// Sets the response-read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.read_timeout = Some(timeout);
        self
    }

    /// Sets the overall per-request deadline.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.request_timeout = Some(timeout);
        self
    }

    /// Caps the number of concurrently in-flight requests.
    pub fn max_in_flight(mut self, ceiling: usize) -> Self {
        self.transport_config.max_in_flight = ceiling;
        self
    }

    /// Sets the retry policy. Disabled by default.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Gates outbound requests with a token-bucket rate limiter.
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Replaces the scalar registry (defaults are preloaded otherwise).
    pub fn scalar_registry(mut self, scalars: ScalarRegistry) -> Self {
        self.scalars = scalars;
        self
    }

    /// Appends a request interceptor; interceptors run in registration
    /// order.
    pub fn request_interceptor(mut self, interceptor: Box<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Appends a response interceptor; interceptors run in registration
    /// order.
    pub fn response_interceptor(mut self, interceptor: Box<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Registers an observer for retry activity.
    pub fn retry_listener(mut self, listener: Box<dyn RetryListener>) -> Self {
        self.retry_listener = Some(listener);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint was provided or the transport
    /// configuration is invalid.
    pub fn build(self) -> Result<Client> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::ConfigurationError("endpoint is required".to_string()))?;

        let transport = Transport::new(endpoint, self.transport_config)?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                default_headers: self.default_headers,
                retry_policy: self.retry_policy,
                rate_limiter: self.rate_limiter,
                scalars: self.scalars,
                request_interceptors: self.request_interceptors,
                response_interceptors: self.response_interceptors,
                retry_listener: self.retry_listener,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

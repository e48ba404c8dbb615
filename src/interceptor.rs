//! Request and response interceptor seams.
//!
//! Interceptors run in registration order; each receives the value produced
//! by the previous one and may transform it or fail the call.

use crate::transport::{RawResponse, WireRequest};
use crate::Result;

/// Transforms the outgoing request before it reaches the transport.
///
/// # Examples
///
/// ```
/// use graphite_client::interceptor::RequestInterceptor;
/// use graphite_client::WireRequest;
///
/// struct TraceHeader;
///
/// impl RequestInterceptor for TraceHeader {
///     fn intercept(&self, mut request: WireRequest) -> graphite_client::Result<WireRequest> {
///         request
///             .headers
///             .insert("x-trace-id", "abc123".parse().expect("static header value"));
///         Ok(request)
///     }
/// }
/// ```
pub trait RequestInterceptor: Send + Sync {
    /// Receives the outgoing request, returns the (possibly transformed)
    /// request to send.
    fn intercept(&self, request: WireRequest) -> Result<WireRequest>;
}

/// Transforms the raw response before it is decoded.
pub trait ResponseInterceptor: Send + Sync {
    /// Receives the raw response, returns the (possibly transformed)
    /// response to decode.
    fn intercept(&self, response: RawResponse) -> Result<RawResponse>;
}

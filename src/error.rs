//! Error types for GraphQL operation execution.
//!
//! This module provides a closed error taxonomy split at the root between
//! client-side failures (connection, timeout, rate limiting, serialization)
//! and server-side failures (HTTP status errors, GraphQL-level errors).
//! Callers branch on the error kind instead of downcasting; the retry-safety
//! predicates are pure functions over the kind and its payload.

use crate::rate_limit::RateLimitInfo;
use crate::response::GraphQlError;
use http::{HeaderMap, StatusCode};
use std::fmt;

/// Which phase of the request timed out.
///
/// Only a connect-phase timeout is guaranteed not to have reached the
/// server, so only that phase is safe to retry automatically for
/// non-idempotent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    /// Timed out while establishing the connection.
    Connect,
    /// Timed out while reading the response body.
    Read,
    /// The overall request deadline elapsed.
    Request,
}

impl TimeoutPhase {
    /// Returns `true` if the request cannot have reached the server.
    pub fn is_safe_to_retry(&self) -> bool {
        matches!(self, TimeoutPhase::Connect)
    }
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPhase::Connect => write!(f, "connect"),
            TimeoutPhase::Read => write!(f, "read"),
            TimeoutPhase::Request => write!(f, "request"),
        }
    }
}

/// The main error type for GraphQL operation execution.
///
/// Every failure the engine can produce is one of these variants; the
/// payload carries what a caller needs to react (host/port, timeout phase,
/// rate-limit hints, status code, the GraphQL error list).
///
/// # Examples
///
/// ```no_run
/// use graphite_client::{Client, Error, Operation};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .endpoint("https://api.example.com/graphql")?
///     .build()?;
///
/// let op = Operation::new("Viewer", "query Viewer { viewer { name } }");
/// match client.execute::<serde_json::Value>(&op).await {
///     Ok(response) => println!("data: {:?}", response.data()),
///     Err(Error::Timeout { phase }) => eprintln!("timed out during {phase}"),
///     Err(Error::Http { status, .. }) => eprintln!("HTTP error {status}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failed to establish a connection (DNS, refused, TLS).
    ///
    /// Host and port are captured when known.
    #[error("connection failed to {}", connection_target(.host, .port))]
    Connection {
        /// The host the connection was attempted to, when known.
        host: Option<String>,
        /// The port the connection was attempted to, when known.
        port: Option<u16>,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request timed out, tagged with the phase that elapsed.
    #[error("request timed out during {phase} phase")]
    Timeout {
        /// Which timeout fired.
        phase: TimeoutPhase,
    },

    /// The request was rejected by rate limiting.
    ///
    /// Raised for a local token-bucket denial (empty payload) or a server
    /// 429 response (payload parsed from rate-limit headers).
    #[error("rate limit exceeded")]
    RateLimited {
        /// Retry-after / reset / remaining hints, when the server sent them.
        info: RateLimitInfo,
    },

    /// The server returned a non-2xx HTTP status.
    ///
    /// 4xx statuses classify as client errors, 5xx as server errors.
    #[error("HTTP error {status}: {raw_response}")]
    Http {
        /// The HTTP status code.
        status: StatusCode,
        /// The raw response body.
        raw_response: String,
        /// The response headers.
        headers: HeaderMap,
        /// Rate limit information parsed from headers, when present.
        rate_limit_info: Option<RateLimitInfo>,
    },

    /// A 200-status response carried one or more GraphQL errors.
    ///
    /// Only [`Response::into_data`](crate::Response::into_data) produces
    /// this variant; `execute` itself returns the response object so
    /// partial-success data stays accessible.
    #[error("{message}")]
    GraphQl {
        /// Aggregated human-readable message (first error, plus a count of
        /// any additional errors).
        message: String,
        /// The full ordered error list from the response.
        errors: Vec<GraphQlError>,
    },

    /// Failed to serialize the request envelope or a variable value.
    #[error("failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Failed to decode the response body into the expected shape.
    ///
    /// Preserves the raw body and the serde message so production decode
    /// failures stay debuggable.
    #[error("failed to decode response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to decode.
        raw_response: String,
        /// The serde error message.
        serde_error: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// Invalid configuration was provided.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// The transport was used after `close()`.
    #[error("transport is closed")]
    TransportClosed,

    /// A network-level failure not otherwise classified.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An invalid URL was provided.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Builds the aggregated GraphQL error for a non-empty error list.
    ///
    /// The message is the first error's message, annotated with the count of
    /// any further errors; the full list is attached.
    pub fn graphql(errors: Vec<GraphQlError>) -> Self {
        let first = errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "graphql error".to_string());
        let message = if errors.len() > 1 {
            format!("{first} (and {} more errors)", errors.len() - 1)
        } else {
            first
        };
        Error::GraphQl { message, errors }
    }

    /// Returns `true` if this error is potentially retryable.
    ///
    /// Connection failures, timeouts, generic network errors, 5xx statuses,
    /// and rate-limit rejections with a server-provided hint are retryable.
    /// 4xx statuses, decode failures, and misuse errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connection { .. } => true,
            Error::Timeout { .. } => true,
            Error::Network(_) => true,
            Error::Http { status, .. } => status.is_server_error(),
            Error::RateLimited { info } => info.retry_after.is_some() || info.reset_at.is_some(),
            _ => false,
        }
    }

    /// Returns `true` for failures that originate on the client side.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::Connection { .. }
            | Error::Timeout { .. }
            | Error::RateLimited { .. }
            | Error::SerializationFailed(_)
            | Error::DeserializationFailed { .. }
            | Error::ConfigurationError(_)
            | Error::TransportClosed
            | Error::Network(_)
            | Error::InvalidUrl(_) => true,
            Error::Http { status, .. } => status.is_client_error(),
            Error::GraphQl { .. } => false,
        }
    }

    /// Returns `true` for failures that originate on the server side.
    pub fn is_server_error(&self) -> bool {
        match self {
            Error::Http { status, .. } => status.is_server_error(),
            Error::GraphQl { .. } => true,
            _ => false,
        }
    }

    /// Returns the HTTP status code if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error carries one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Http { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns rate limit information if available.
    ///
    /// Present on rate-limit rejections and on HTTP errors whose headers
    /// carried rate-limit data.
    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        match self {
            Error::RateLimited { info } => Some(info),
            Error::Http {
                rate_limit_info, ..
            } => rate_limit_info.as_ref(),
            _ => None,
        }
    }

    /// Returns the GraphQL error list if this is a GraphQL-level error.
    pub fn graphql_errors(&self) -> Option<&[GraphQlError]> {
        match self {
            Error::GraphQl { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Returns the first GraphQL error, if any.
    pub fn first_graphql_error(&self) -> Option<&GraphQlError> {
        self.graphql_errors().and_then(|errors| errors.first())
    }

    /// Returns the GraphQL errors whose `extensions.code` matches `code`.
    ///
    /// Follows the common convention of carrying a machine-readable error
    /// code in the `extensions` map.
    pub fn graphql_errors_with_code<'a>(&'a self, code: &str) -> Vec<&'a GraphQlError> {
        self.graphql_errors()
            .map(|errors| errors.iter().filter(|e| e.code() == Some(code)).collect())
            .unwrap_or_default()
    }
}

fn connection_target(host: &Option<String>, port: &Option<u16>) -> String {
    match (host, port) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.clone(),
        _ => "<unknown>".to_string(),
    }
}

/// A specialized `Result` type for GraphQL operation execution.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::GraphQlError;

    fn graphql_error(message: &str, code: Option<&str>) -> GraphQlError {
        let mut extensions = serde_json::Map::new();
        if let Some(code) = code {
            extensions.insert("code".to_string(), serde_json::json!(code));
        }
        GraphQlError {
            message: message.to_string(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions,
        }
    }

    #[test]
    fn test_aggregated_message_single_error() {
        let err = Error::graphql(vec![graphql_error("boom", None)]);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_aggregated_message_counts_additional_errors() {
        let err = Error::graphql(vec![
            graphql_error("first failure", None),
            graphql_error("second failure", None),
            graphql_error("third failure", None),
        ]);
        assert_eq!(err.to_string(), "first failure (and 2 more errors)");
        assert_eq!(err.graphql_errors().unwrap().len(), 3);
    }

    #[test]
    fn test_code_filtering() {
        let err = Error::graphql(vec![
            graphql_error("nope", Some("FORBIDDEN")),
            graphql_error("gone", Some("NOT_FOUND")),
            graphql_error("also nope", Some("FORBIDDEN")),
        ]);
        let forbidden = err.graphql_errors_with_code("FORBIDDEN");
        assert_eq!(forbidden.len(), 2);
        assert_eq!(forbidden[0].message, "nope");
        assert_eq!(err.first_graphql_error().unwrap().message, "nope");
    }

    #[test]
    fn test_http_5xx_is_retryable_server_error() {
        let err = Error::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            raw_response: "boom".to_string(),
            headers: HeaderMap::new(),
            rate_limit_info: None,
        };
        assert!(err.is_retryable());
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_http_4xx_is_client_error_not_retryable() {
        let err = Error::Http {
            status: StatusCode::BAD_REQUEST,
            raw_response: "bad".to_string(),
            headers: HeaderMap::new(),
            rate_limit_info: None,
        };
        assert!(!err.is_retryable());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_timeout_phase_retry_safety() {
        assert!(TimeoutPhase::Connect.is_safe_to_retry());
        assert!(!TimeoutPhase::Read.is_safe_to_retry());
        assert!(!TimeoutPhase::Request.is_safe_to_retry());
        let err = Error::Timeout {
            phase: TimeoutPhase::Connect,
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "request timed out during connect phase");
    }

    #[test]
    fn test_local_rate_limit_denial_is_not_retryable() {
        let err = Error::RateLimited {
            info: RateLimitInfo::default(),
        };
        assert!(!err.is_retryable());
        assert!(err.rate_limit_info().is_some());
    }
}

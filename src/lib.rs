//! # Graphite - a GraphQL client toolkit
//!
//! Graphite is a typed GraphQL client built on top of `reqwest`, paired
//! with a schema-driven code generation front end. The runtime side
//! executes operations through a configurable pipeline — interceptors,
//! rate limiting, retries with backoff, typed error classification — and
//! the build-time side parses introspection documents into a schema model
//! that drives Rust type mapping.
//!
//! ## Quick Start
//!
//! ```no_run
//! use graphite_client::{BackoffStrategy, Client, Operation, RetryPolicy};
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Deserialize)]
//! struct ViewerData {
//!     viewer: Viewer,
//! }
//!
//! #[derive(Deserialize)]
//! struct Viewer {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), graphite_client::Error> {
//!     let backoff = BackoffStrategy::exponential(
//!         Duration::from_millis(100),
//!         Duration::from_secs(10),
//!         2.0,
//!     )?
//!     .with_jitter(0.5)?;
//!
//!     let client = Client::builder()
//!         .endpoint("https://api.example.com/graphql")?
//!         .default_header("authorization", "Bearer token")?
//!         .request_timeout(Duration::from_secs(30))
//!         .retry_policy(RetryPolicy::transient(3, backoff))
//!         .build()?;
//!
//!     let op = Operation::new("Viewer", "query Viewer { viewer { name } }");
//!     let response = client.execute::<ViewerData>(&op).await?;
//!     println!("viewer: {}", response.into_data()?.viewer.name);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Typed operations and responses** - operations carry their variables;
//!   responses decode into your types with partial-success semantics
//!   preserved (data and errors are independent)
//! - **Closed error taxonomy** - connection, phase-tagged timeout,
//!   rate-limit, HTTP-status, and GraphQL-level failures as one sum type
//!   with pure retry-safety predicates
//! - **Flexible retry logic** - exponential/fixed backoff with optional
//!   jitter, composable retry predicates, and a retry listener hook
//! - **Rate limiting** - a non-blocking token bucket gates outbound
//!   requests; server 429 hints are parsed into the error payload
//! - **Interceptors** - ordered request/response transformation seams
//! - **Schema tooling** - introspection parsing into a normalized
//!   [`schema::SchemaModel`] and Rust type-name mapping for code
//!   generation (see the `graphite-codegen` binary)
//! - **Structured logging** - request lifecycle events via `tracing`
//!
//! ## Partial success
//!
//! A GraphQL response may carry both data and errors. `execute` never
//! converts errors into `Err`; [`Response::into_data`] is the strict
//! accessor that does:
//!
//! ```no_run
//! # use graphite_client::{Client, Operation};
//! # async fn example() -> Result<(), graphite_client::Error> {
//! # let client = Client::builder().endpoint("https://api.example.com/graphql")?.build()?;
//! let op = Operation::new("Feed", "query Feed { feed { title } }");
//! let response = client.execute::<serde_json::Value>(&op).await?;
//!
//! if response.has_data() && response.has_errors() {
//!     // Partial success: inspect both sides.
//!     println!("kept {} errors alongside data", response.errors().len());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod operation;
mod response;

pub mod backoff;
pub mod interceptor;
pub mod rate_limit;
pub mod retry;
pub mod scalar;
pub mod schema;
pub mod transport;

pub use backoff::BackoffStrategy;
pub use client::{Client, ClientBuilder};
pub use error::{Error, Result, TimeoutPhase};
pub use operation::{Operation, PreparedOperation};
pub use rate_limit::{RateLimitInfo, RateLimiter};
pub use response::{ErrorLocation, GraphQlError, PathSegment, Response};
pub use retry::{RetryListener, RetryPolicy, RetryPredicate};
pub use scalar::{Coercing, CoercingError, ScalarRegistry};
pub use transport::{RawResponse, Transport, TransportConfig, WireRequest};

//! GraphQL response decoding and the typed response wrapper.
//!
//! Data and errors are independent: a response may carry both (partial
//! success per the GraphQL spec), either one alone, or neither. `execute`
//! always returns the full [`Response`]; only
//! [`into_data`](Response::into_data) converts a non-empty error list into
//! an [`Error`].

use crate::transport::RawResponse;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The result of one executed operation.
///
/// # Examples
///
/// ```no_run
/// use graphite_client::{Client, Operation};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct UserData {
///     user: User,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), graphite_client::Error> {
/// # let client = Client::builder().endpoint("https://api.example.com/graphql")?.build()?;
/// let op = Operation::new("GetUser", "query GetUser { user { name } }");
/// let response = client.execute::<UserData>(&op).await?;
///
/// // Inspect partial success explicitly...
/// if response.has_errors() {
///     for error in response.errors() {
///         eprintln!("server error: {}", error.message);
///     }
/// }
///
/// // ...or insist on an error-free response.
/// let data = response.into_data()?;
/// println!("user: {}", data.user.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: Option<T>,
    errors: Vec<GraphQlError>,
    extensions: Map<String, Value>,
}

impl<T> Response<T> {
    /// Assembles a response from its decoded parts.
    pub fn new(data: Option<T>, errors: Vec<GraphQlError>, extensions: Map<String, Value>) -> Self {
        Self {
            data,
            errors,
            extensions,
        }
    }

    /// The decoded `data` field, if the server sent one.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// The ordered GraphQL error list.
    pub fn errors(&self) -> &[GraphQlError] {
        &self.errors
    }

    /// Server extension metadata.
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// Returns `true` if the response carries data.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Returns `true` if the response carries GraphQL errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consumes the response, returning the data or an error.
    ///
    /// Strict all-or-nothing accessor: any non-empty error list fails with
    /// the aggregated GraphQL error, even when partial data is present.
    /// Callers who want partial-success handling use [`data`](Self::data)
    /// and [`errors`](Self::errors) instead.
    pub fn into_data(self) -> Result<T> {
        if !self.errors.is_empty() {
            return Err(Error::graphql(self.errors));
        }
        self.data.ok_or_else(|| Error::GraphQl {
            message: "response contained no data".to_string(),
            errors: Vec::new(),
        })
    }

    /// Maps the decoded data to a different type, keeping errors and
    /// extensions.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: self.data.map(f),
            errors: self.errors,
            extensions: self.extensions,
        }
    }
}

/// One entry of a GraphQL `errors` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    /// The error message.
    pub message: String,
    /// Source locations in the query document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    /// Path from the response root to the failed field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    /// Extension payload; commonly carries a machine-readable `code`.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl GraphQlError {
    /// The `extensions.code` value, per the common error-code convention.
    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code").and_then(Value::as_str)
    }
}

/// A line/column position in the query document (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    /// Line number.
    pub line: u32,
    /// Column number.
    pub column: u32,
}

/// One step of an error path: a field name or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An array index.
    Index(u64),
    /// A field name.
    Field(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
    #[serde(default)]
    extensions: Map<String, Value>,
}

/// Decodes a raw response body into a typed [`Response`].
///
/// An empty or blank body is a decode failure, not silently-absent data.
/// `data: null` is tolerated and maps to `None`.
pub(crate) fn decode<T: DeserializeOwned>(raw: &RawResponse) -> Result<Response<T>> {
    if raw.body.trim().is_empty() {
        return Err(Error::DeserializationFailed {
            raw_response: raw.body.clone(),
            serde_error: "empty response body".to_string(),
            status: raw.status,
        });
    }

    let envelope: Envelope =
        serde_json::from_str(&raw.body).map_err(|err| Error::DeserializationFailed {
            raw_response: raw.body.clone(),
            serde_error: err.to_string(),
            status: raw.status,
        })?;

    let data = match envelope.data {
        None | Some(Value::Null) => None,
        Some(value) => Some(serde_json::from_value::<T>(value).map_err(|err| {
            Error::DeserializationFailed {
                raw_response: raw.body.clone(),
                serde_error: err.to_string(),
                status: raw.status,
            }
        })?),
    };

    Ok(Response::new(data, envelope.errors, envelope.extensions))
}

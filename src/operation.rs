//! GraphQL operation values and the wire envelope.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// An immutable description of one GraphQL request: operation name,
/// document text, and variables.
///
/// Operations are built once (by hand or by generated code) and consumed
/// per `execute` call; the client never mutates them.
///
/// # Examples
///
/// ```
/// use graphite_client::Operation;
///
/// let op = Operation::new("GetUser", "query GetUser($id: ID!) { user(id: $id) { name } }")
///     .variable("id", "42")
///     .unwrap();
/// assert_eq!(op.name(), "GetUser");
/// ```
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    document: String,
    variables: Map<String, Value>,
}

impl Operation {
    /// Creates an operation from its name and document text.
    pub fn new(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            document: document.into(),
            variables: Map::new(),
        }
    }

    /// Adds a variable, serializing the value to JSON.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|err| Error::SerializationFailed(err.to_string()))?;
        self.variables.insert(name.into(), value);
        Ok(self)
    }

    /// Adds an already-serialized variable value.
    pub fn variable_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The GraphQL document text.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The variable map.
    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// Serializes the operation into the POST envelope:
    /// `{"query": ..., "operationName": ..., "variables": {...}}`, with
    /// `variables` omitted when empty.
    pub(crate) fn to_envelope(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(self.document.clone()));
        body.insert(
            "operationName".to_string(),
            Value::String(self.name.clone()),
        );
        if !self.variables.is_empty() {
            body.insert(
                "variables".to_string(),
                Value::Object(self.variables.clone()),
            );
        }
        Value::Object(body)
    }
}

/// A generated operation: document text plus its expected response shape.
///
/// Generated code implements this so callers can execute an operation
/// without repeating the document or the result type.
///
/// # Examples
///
/// ```
/// use graphite_client::PreparedOperation;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct ViewerData {
///     viewer: Viewer,
/// }
///
/// #[derive(Deserialize)]
/// struct Viewer {
///     name: String,
/// }
///
/// struct ViewerQuery;
///
/// impl PreparedOperation for ViewerQuery {
///     const NAME: &'static str = "Viewer";
///     const DOCUMENT: &'static str = "query Viewer { viewer { name } }";
///     type Response = ViewerData;
/// }
/// ```
pub trait PreparedOperation {
    /// The operation name.
    const NAME: &'static str;
    /// The GraphQL document text.
    const DOCUMENT: &'static str;
    /// The decoded shape of the `data` field.
    type Response: DeserializeOwned;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_includes_query_and_name() {
        let op = Operation::new("Ping", "query Ping { ping }");
        let envelope = op.to_envelope();
        assert_eq!(envelope["query"], "query Ping { ping }");
        assert_eq!(envelope["operationName"], "Ping");
        assert!(envelope.get("variables").is_none());
    }

    #[test]
    fn test_envelope_includes_non_empty_variables() {
        let op = Operation::new("GetUser", "query GetUser($id: ID!) { user(id: $id) { name } }")
            .variable("id", "42")
            .unwrap()
            .variable_value("limit", json!(10));
        let envelope = op.to_envelope();
        assert_eq!(envelope["variables"]["id"], "42");
        assert_eq!(envelope["variables"]["limit"], 10);
    }
}

//! Custom scalar coercion between wire values and native representations.
//!
//! A [`Coercing`] is a pair of stateless conversion functions over JSON
//! values: `serialize` validates and canonicalizes an outgoing value,
//! `deserialize` does the same for an incoming one. The [`ScalarRegistry`]
//! maps scalar names to coercings; [`ScalarRegistry::with_defaults`] covers
//! the common extension scalars.
//!
//! Numeric scalars wider than an `f64` mantissa (Long, BigInteger,
//! BigDecimal) travel as decimal strings so a JSON-number representation
//! never loses precision.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Why a coercion failed.
///
/// A string of the right kind with a bad format is `Unparseable`; a value
/// of a wholly wrong kind is `UnsupportedType`. Callers use the split to
/// distinguish user typos from programming errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercingError {
    /// The value had the expected kind but could not be parsed.
    #[error("unparseable {scalar} value: {detail}")]
    Unparseable {
        /// The scalar being coerced.
        scalar: &'static str,
        /// What went wrong.
        detail: String,
    },

    /// The value had a kind the scalar does not accept at all.
    #[error("unsupported input for {scalar}: expected {expected}, got {actual}")]
    UnsupportedType {
        /// The scalar being coerced.
        scalar: &'static str,
        /// The kind(s) the scalar accepts.
        expected: &'static str,
        /// The kind that was supplied.
        actual: &'static str,
    },
}

type CoercingFn = Arc<dyn Fn(&Value) -> Result<Value, CoercingError> + Send + Sync>;

/// A bidirectional converter for one named scalar type.
///
/// Both directions are pure functions over `serde_json::Value`; a coercing
/// holds no state and is cheap to clone.
#[derive(Clone)]
pub struct Coercing {
    serialize: CoercingFn,
    deserialize: CoercingFn,
}

impl Coercing {
    /// Creates a coercing from its two conversion functions.
    pub fn new(
        serialize: impl Fn(&Value) -> Result<Value, CoercingError> + Send + Sync + 'static,
        deserialize: impl Fn(&Value) -> Result<Value, CoercingError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    /// Converts a native value into its wire representation.
    pub fn serialize(&self, value: &Value) -> Result<Value, CoercingError> {
        (self.serialize)(value)
    }

    /// Converts a wire value into its native representation.
    pub fn deserialize(&self, value: &Value) -> Result<Value, CoercingError> {
        (self.deserialize)(value)
    }
}

/// Registry of scalar coercings, keyed by schema scalar name.
///
/// # Examples
///
/// ```
/// use graphite_client::{Coercing, ScalarRegistry};
/// use serde_json::json;
///
/// let registry = ScalarRegistry::with_defaults();
/// let uuid = registry.get("UUID").unwrap();
/// let value = uuid
///     .deserialize(&json!("6B29FC40-CA47-1067-B31D-00DD010662DA"))
///     .unwrap();
/// assert_eq!(value, json!("6b29fc40-ca47-1067-b31d-00dd010662da"));
/// ```
#[derive(Clone)]
pub struct ScalarRegistry {
    coercings: HashMap<String, Coercing>,
}

impl ScalarRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            coercings: HashMap::new(),
        }
    }

    /// Creates a registry preloaded with the built-in extension scalars:
    /// DateTime, Date, Time, UUID, Long, BigInteger, BigDecimal, JSON,
    /// Void.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("DateTime", datetime_coercing());
        registry.register("Date", date_coercing());
        registry.register("Time", time_coercing());
        registry.register("UUID", uuid_coercing());
        registry.register("Long", integer_string_coercing("Long"));
        registry.register("BigInteger", integer_string_coercing("BigInteger"));
        registry.register("BigDecimal", decimal_string_coercing());
        registry.register("JSON", json_coercing());
        registry.register("Void", void_coercing());
        registry
    }

    /// Associates `name` with `coercing`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, coercing: Coercing) {
        self.coercings.insert(name.into(), coercing);
    }

    /// Returns the coercing for `name`, if registered.
    pub fn get(&self, name: &str) -> Option<&Coercing> {
        self.coercings.get(name)
    }

    /// Returns `true` if a coercing is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.coercings.contains_key(name)
    }
}

impl Default for ScalarRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, CoercingError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| CoercingError::Unparseable {
            scalar: "DateTime",
            detail: format!("{s:?}: {err}"),
        })
}

fn format_instant(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// ISO-8601 instant. Deserialize additionally accepts epoch milliseconds.
fn datetime_coercing() -> Coercing {
    Coercing::new(
        |value| match value {
            Value::String(s) => parse_instant(s).map(format_instant),
            other => Err(CoercingError::UnsupportedType {
                scalar: "DateTime",
                expected: "ISO-8601 string",
                actual: value_kind(other),
            }),
        },
        |value| match value {
            Value::String(s) => parse_instant(s).map(format_instant),
            Value::Number(n) => {
                let millis = n.as_i64().ok_or_else(|| CoercingError::Unparseable {
                    scalar: "DateTime",
                    detail: format!("epoch milliseconds out of range: {n}"),
                })?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(format_instant)
                    .ok_or_else(|| CoercingError::Unparseable {
                        scalar: "DateTime",
                        detail: format!("epoch milliseconds out of range: {millis}"),
                    })
            }
            other => Err(CoercingError::UnsupportedType {
                scalar: "DateTime",
                expected: "ISO-8601 string or epoch milliseconds",
                actual: value_kind(other),
            }),
        },
    )
}

/// ISO-8601 calendar date (`YYYY-MM-DD`).
fn date_coercing() -> Coercing {
    fn convert(value: &Value) -> Result<Value, CoercingError> {
        match value {
            Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .map_err(|err| CoercingError::Unparseable {
                    scalar: "Date",
                    detail: format!("{s:?}: {err}"),
                }),
            other => Err(CoercingError::UnsupportedType {
                scalar: "Date",
                expected: "ISO-8601 date string",
                actual: value_kind(other),
            }),
        }
    }
    Coercing::new(convert, convert)
}

/// ISO-8601 time of day. Seconds are optional on input and always emitted.
fn time_coercing() -> Coercing {
    fn convert(value: &Value) -> Result<Value, CoercingError> {
        match value {
            Value::String(s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
                .map_err(|err| CoercingError::Unparseable {
                    scalar: "Time",
                    detail: format!("{s:?}: {err}"),
                }),
            other => Err(CoercingError::UnsupportedType {
                scalar: "Time",
                expected: "ISO-8601 time string",
                actual: value_kind(other),
            }),
        }
    }
    Coercing::new(convert, convert)
}

/// Canonical (lowercase hyphenated) UUID string.
fn uuid_coercing() -> Coercing {
    fn convert(value: &Value) -> Result<Value, CoercingError> {
        match value {
            Value::String(s) => Uuid::parse_str(s)
                .map(|u| Value::String(u.hyphenated().to_string()))
                .map_err(|err| CoercingError::Unparseable {
                    scalar: "UUID",
                    detail: format!("{s:?}: {err}"),
                }),
            other => Err(CoercingError::UnsupportedType {
                scalar: "UUID",
                expected: "UUID string",
                actual: value_kind(other),
            }),
        }
    }
    Coercing::new(convert, convert)
}

fn is_decimal_integer(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal_number(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (unsigned, None),
    };
    let mantissa_ok = {
        let mut digits = 0usize;
        let mut dots = 0usize;
        for b in mantissa.bytes() {
            match b {
                b'0'..=b'9' => digits += 1,
                b'.' => dots += 1,
                _ => return false,
            }
        }
        digits >= 1 && dots <= 1
    };
    let exponent_ok = match exponent {
        None => true,
        Some(e) => is_decimal_integer(e),
    };
    mantissa_ok && exponent_ok
}

/// Arbitrary-magnitude integers carried as decimal strings.
///
/// String form avoids the precision loss a JSON number would suffer past
/// 2^53. Numeric input is accepted and canonicalized to a string.
fn integer_string_coercing(scalar: &'static str) -> Coercing {
    let convert = move |value: &Value| match value {
        Value::String(s) => {
            if is_decimal_integer(s) {
                Ok(Value::String(s.clone()))
            } else {
                Err(CoercingError::Unparseable {
                    scalar,
                    detail: format!("not a decimal integer: {s:?}"),
                })
            }
        }
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(Value::String(n.to_string()))
            } else {
                Err(CoercingError::Unparseable {
                    scalar,
                    detail: format!("not an integer: {n}"),
                })
            }
        }
        other => Err(CoercingError::UnsupportedType {
            scalar,
            expected: "decimal string or integer",
            actual: value_kind(other),
        }),
    };
    Coercing::new(convert, convert)
}

/// Arbitrary-precision decimals carried as strings.
fn decimal_string_coercing() -> Coercing {
    fn convert(value: &Value) -> Result<Value, CoercingError> {
        match value {
            Value::String(s) => {
                if is_decimal_number(s) {
                    Ok(Value::String(s.clone()))
                } else {
                    Err(CoercingError::Unparseable {
                        scalar: "BigDecimal",
                        detail: format!("not a decimal number: {s:?}"),
                    })
                }
            }
            Value::Number(n) => Ok(Value::String(n.to_string())),
            other => Err(CoercingError::UnsupportedType {
                scalar: "BigDecimal",
                expected: "decimal string or number",
                actual: value_kind(other),
            }),
        }
    }
    Coercing::new(convert, convert)
}

/// Arbitrary nested structure, passed through untouched.
fn json_coercing() -> Coercing {
    fn convert(value: &Value) -> Result<Value, CoercingError> {
        Ok(value.clone())
    }
    Coercing::new(convert, convert)
}

/// Always null, regardless of input.
fn void_coercing() -> Coercing {
    fn convert(_value: &Value) -> Result<Value, CoercingError> {
        Ok(Value::Null)
    }
    Coercing::new(convert, convert)
}

//! Request body model and JSON decoding
//!
//! `HelloData` is the record every `/request-body-json-*` route binds to.
//! Decoding is permissive: unknown fields are ignored and missing or `null`
//! fields take their default value. Anything that is not a JSON object is
//! rejected.

use http::HeaderMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Decoded request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloData {
    /// User name (`""` when absent)
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,

    /// Age (`0` when absent)
    #[serde(default, deserialize_with = "null_as_default")]
    pub age: i32,
}

impl HelloData {
    /// Create a new record
    pub fn new(username: impl Into<String>, age: i32) -> Self {
        Self {
            username: username.into(),
            age,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error raised when a request body cannot be turned into a `HelloData`
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Body is not well-formed JSON
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Body is JSON but not an object
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A recognized field has the wrong type
    #[error("invalid field: {0}")]
    Shape(#[source] serde_json::Error),

    /// Body is not valid UTF-8 text
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Decode a raw JSON body into a `HelloData`
pub fn decode(body: &[u8]) -> Result<HelloData, DecodeError> {
    let value: Value = serde_json::from_slice(body).map_err(DecodeError::Syntax)?;
    match value {
        Value::Object(_) => HelloData::deserialize(value).map_err(DecodeError::Shape),
        other => Err(DecodeError::NotAnObject(json_kind(&other))),
    }
}

/// Decode a body that was already read as text
pub fn decode_str(body: &str) -> Result<HelloData, DecodeError> {
    decode(body.as_bytes())
}

/// Read a raw body as UTF-8 text
pub fn body_as_string(body: &[u8]) -> Result<String, DecodeError> {
    Ok(std::str::from_utf8(body)?.to_owned())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A decoded body together with the request headers
#[derive(Debug, Clone)]
pub struct HttpEntity<T> {
    headers: HeaderMap,
    body: T,
}

impl<T> HttpEntity<T> {
    /// Create an entity from headers and a decoded body
    pub fn new(headers: HeaderMap, body: T) -> Self {
        Self { headers, body }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &T {
        &self.body
    }

    pub fn into_body(self) -> T {
        self.body
    }
}

//! JSON response encoding
//!
//! Every body is an [`Envelope`]: one or more named top-level keys, never a
//! bare array or scalar. Output is tab-indented with a trailing newline.

use std::collections::BTreeMap;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Value};
use thiserror::Error;

/// Failure to serialize a response value
#[derive(Debug, Error)]
#[error("failed to encode response: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Named wrapper around a response body
///
/// # Example
///
/// ```rust
/// use hotel_api::codec::Envelope;
///
/// let envelope = Envelope::new()
///     .with("message", "guest successfully deleted")
///     .unwrap();
/// assert!(envelope.get("message").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope(BTreeMap<String, Value>);

impl Envelope {
    /// Create an empty envelope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelope holding a single named value
    pub fn wrap(key: impl Into<String>, value: impl Serialize) -> Result<Self, EncodeError> {
        Self::new().with(key, value)
    }

    /// Add a named value
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Result<Self, EncodeError> {
        self.0.insert(key.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Look up a named value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Serialize `value` as tab-indented JSON followed by a newline
pub fn to_pretty_bytes(value: &impl Serialize) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Build a JSON response
///
/// Every value of every `extra_headers` entry is appended first; the
/// `Content-Type` is then set to `application/json`, replacing any caller
/// supplied value.
pub fn write_json(
    status: StatusCode,
    envelope: &Envelope,
    extra_headers: &HeaderMap,
) -> Result<Response, EncodeError> {
    let body = to_pretty_bytes(envelope)?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in extra_headers {
        headers.append(name.clone(), value.clone());
    }
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok(response)
}

//! Strict JSON request decoding
//!
//! Bodies are read through a length-limited stream, so an oversized request
//! stops being read as soon as it crosses the limit. Decoding then rejects
//! unknown keys (every input shape carries `deny_unknown_fields`) and any
//! content after the first JSON value.
//!
//! The destination is any `T: DeserializeOwned`; a destination that cannot be
//! decoded into does not compile.

use axum::body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use thiserror::Error;

/// Default request body limit: 1 MiB
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_048_576;

/// Why a request body could not be decoded
///
/// The `Display` text of each variant is the message returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Body is not valid JSON at byte `offset`
    #[error("Body contains badly-formed JSON (at character {offset})")]
    MalformedSyntax { offset: usize },

    /// Body ends in the middle of a JSON value
    #[error("Body contains badly-formed JSON")]
    UnexpectedEof,

    /// A value's JSON type does not fit the destination field
    #[error("{}", type_mismatch_message(.field, .offset))]
    TypeMismatch { field: Option<String>, offset: usize },

    /// Zero-length (or whitespace-only) body
    #[error("Body must not be empty")]
    EmptyBody,

    /// Key not declared by the destination shape
    #[error("Body contains unknown key \"{name}\"")]
    UnknownField { name: String },

    /// Body exceeded the configured limit
    #[error("Body must not be larger than {limit_bytes} bytes")]
    BodyTooLarge { limit_bytes: usize },

    /// Anything other than whitespace follows the first JSON value
    #[error("Body must only contain a single JSON value")]
    MultipleValues,

    /// Any other data error reported by the deserializer
    #[error("Body contains invalid JSON: {message}")]
    Invalid { message: String },

    /// The client stream failed before the body was complete
    #[error("Body could not be read")]
    Unreadable,
}

fn type_mismatch_message(field: &Option<String>, offset: &usize) -> String {
    match field {
        Some(field) => format!("Body contains incorrect JSON type for field \"{field}\""),
        None => format!("Body contains incorrect JSON type (at character {offset})"),
    }
}

/// Read at most `max_bytes` from `body` and decode it strictly into `T`
///
/// Returns [`DecodeError::BodyTooLarge`] without parsing anything once the
/// stream crosses the limit. Dropping the future abandons the read.
pub async fn read_json<T>(body: Body, max_bytes: usize) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    let bytes = match Limited::new(body, max_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.is::<LengthLimitError>() => {
            return Err(DecodeError::BodyTooLarge {
                limit_bytes: max_bytes,
            })
        }
        Err(err) => {
            tracing::debug!(error = %err, "request body stream failed");
            return Err(DecodeError::Unreadable);
        }
    };

    decode_json(&bytes)
}

/// Decode a complete body strictly into `T`
///
/// # Example
///
/// ```rust
/// use hotel_api::codec::{decode_json, DecodeError};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// #[serde(deny_unknown_fields)]
/// struct Input {
///     name: String,
/// }
///
/// let input: Input = decode_json(br#"{"name": "George"}"#).unwrap();
/// assert_eq!(input.name, "George");
///
/// let err = decode_json::<Input>(br#"{"name": "George", "extra": 1}"#).unwrap_err();
/// assert_eq!(err, DecodeError::UnknownField { name: "extra".to_string() });
/// ```
pub fn decode_json<T>(bytes: &[u8]) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::EmptyBody);
    }

    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| classify(bytes, err))?;

    deserializer
        .end()
        .map_err(|_| DecodeError::MultipleValues)?;

    Ok(value)
}

fn classify(bytes: &[u8], err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let path = err.path().to_string();
    let inner = err.into_inner();
    let offset = byte_offset(bytes, inner.line(), inner.column());

    match inner.classify() {
        Category::Syntax => DecodeError::MalformedSyntax { offset },
        Category::Eof => DecodeError::UnexpectedEof,
        Category::Data => {
            let message = inner.to_string();
            if let Some(name) = unknown_field_name(&message) {
                DecodeError::UnknownField { name }
            } else if is_type_error(&message) {
                let field = (path != ".").then_some(path);
                DecodeError::TypeMismatch { field, offset }
            } else {
                DecodeError::Invalid {
                    message: strip_position(&message).to_string(),
                }
            }
        }
        // Decoding from an in-memory slice performs no I/O.
        Category::Io => unreachable!("slice deserializer reported an I/O error: {inner}"),
    }
}

/// Byte offset of a 1-based line and column reported by serde_json
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> usize {
    let preceding: usize = bytes
        .split(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum();
    preceding + column
}

fn unknown_field_name(message: &str) -> Option<String> {
    let rest = message.strip_prefix("unknown field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

fn is_type_error(message: &str) -> bool {
    message.starts_with("invalid type:")
        || message.starts_with("invalid value:")
        || message.starts_with("invalid length")
}

fn strip_position(message: &str) -> &str {
    message
        .rfind(" at line ")
        .map_or(message, |idx| &message[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default, deny_unknown_fields)]
    struct Input {
        name: String,
        age: i32,
    }

    #[test]
    fn test_decode_valid_body() {
        let input: Input = decode_json(br#"{"name": "George"}"#).unwrap();
        assert_eq!(input.name, "George");
        assert_eq!(input.age, 0);
    }

    #[test]
    fn test_decode_unknown_field() {
        let err = decode_json::<Input>(br#"{"name": "George", "extra": 1}"#).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownField {
                name: "extra".to_string()
            }
        );
        assert_eq!(err.to_string(), "Body contains unknown key \"extra\"");
    }

    #[test]
    fn test_decode_empty_body() {
        assert_eq!(decode_json::<Input>(b"").unwrap_err(), DecodeError::EmptyBody);
        assert_eq!(
            decode_json::<Input>(b"  \n\t").unwrap_err(),
            DecodeError::EmptyBody
        );
    }

    #[test]
    fn test_decode_truncated_body() {
        let err = decode_json::<Input>(br#"{"name": "Geo"#).unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedEof);
        assert_eq!(err.to_string(), "Body contains badly-formed JSON");
    }

    #[test]
    fn test_decode_malformed_syntax() {
        let err = decode_json::<Input>(br#"{"name": George}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedSyntax { .. }));
        assert!(err
            .to_string()
            .starts_with("Body contains badly-formed JSON (at character "));
    }

    #[test]
    fn test_decode_type_mismatch_names_field() {
        let err = decode_json::<Input>(br#"{"age": "forty"}"#).unwrap_err();
        match &err {
            DecodeError::TypeMismatch { field, .. } => {
                assert_eq!(field.as_deref(), Some("age"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Body contains incorrect JSON type for field \"age\""
        );
    }

    #[test]
    fn test_decode_type_mismatch_at_root() {
        let err = decode_json::<Input>(br#""George""#).unwrap_err();
        match err {
            DecodeError::TypeMismatch { field, .. } => assert!(field.is_none()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_multiple_values() {
        let err = decode_json::<Input>(br#"{"name": "a"}{"name": "b"}"#).unwrap_err();
        assert_eq!(err, DecodeError::MultipleValues);
        assert_eq!(err.to_string(), "Body must only contain a single JSON value");
    }

    #[test]
    fn test_decode_trailing_whitespace_is_accepted() {
        let input: Input = decode_json(b"{\"name\": \"a\"}\n\n  ").unwrap();
        assert_eq!(input.name, "a");
    }

    #[tokio::test]
    async fn test_read_json_within_limit() {
        let input: Input = read_json(Body::from(r#"{"name": "George"}"#), 64)
            .await
            .unwrap();
        assert_eq!(input.name, "George");
    }

    #[tokio::test]
    async fn test_read_json_body_too_large() {
        // Not JSON at all: parsing must never be attempted.
        let oversized = vec![b'x'; 65];
        let err = read_json::<Input>(Body::from(oversized), 64)
            .await
            .unwrap_err();
        assert_eq!(err, DecodeError::BodyTooLarge { limit_bytes: 64 });
        assert_eq!(err.to_string(), "Body must not be larger than 64 bytes");
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(byte_offset(b"abc", 1, 2), 2);
        assert_eq!(byte_offset(b"ab\ncd", 2, 1), 4);
        assert_eq!(byte_offset(b"", 1, 0), 0);
    }

    #[test]
    fn test_unknown_field_name() {
        assert_eq!(
            unknown_field_name("unknown field `extra`, expected `name` or `age`"),
            Some("extra".to_string())
        );
        assert_eq!(unknown_field_name("missing field `name`"), None);
    }

    #[test]
    fn test_strip_position() {
        assert_eq!(
            strip_position("missing field `name` at line 1 column 2"),
            "missing field `name`"
        );
        assert_eq!(strip_position("no position"), "no position");
    }
}

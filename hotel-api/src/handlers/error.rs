//! API error types for handler operations
//!
//! Every failure a handler can surface is an [`ApiError`], rendered as
//! `{"error": ...}` through the JSON codec. The payload is a single message,
//! or a field-to-message map for validation failures.
//!
//! # Example
//!
//! ```rust
//! use hotel_api::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found();
//! assert_eq!(error.kind, ApiErrorKind::NotFound);
//! assert_eq!(error.kind.status_code().as_u16(), 404);
//! ```

use std::fmt;
use std::time::Duration;

use axum::{
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::codec::{write_json, DecodeError, EncodeError, Envelope};
use crate::repository::{RepositoryError, RepositoryErrorKind};
use crate::validator::{ValidationErrors, Validator};

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Request body or parameters could not be decoded
    BadRequest,
    /// Resource absent, or an id that cannot name one
    NotFound,
    /// Route exists but not for this method
    MethodNotAllowed,
    /// Optimistic concurrency check failed
    EditConflict,
    /// Decoded input broke a field rule
    FailedValidation,
    /// Client exceeded its request budget
    RateLimited,
    /// Handler did not finish within the request timeout
    RequestTimeout,
    /// Anything the client cannot fix
    Internal,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::MethodNotAllowed => write!(f, "method_not_allowed"),
            Self::EditConflict => write!(f, "edit_conflict"),
            Self::FailedValidation => write!(f, "failed_validation"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::RequestTimeout => write!(f, "request_timeout"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::EditConflict => StatusCode::CONFLICT,
            Self::FailedValidation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of the `error` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(ValidationErrors),
}

/// Structured API error
#[derive(Debug, Clone)]
pub struct ApiError {
    /// The category of error
    pub kind: ApiErrorKind,
    /// What the client sees under `error`
    pub detail: ErrorDetail,
    /// Extra response headers
    pub headers: HeaderMap,
    /// Server-side cause, logged and never sent
    source: Option<String>,
}

impl ApiError {
    fn new(kind: ApiErrorKind, detail: ErrorDetail) -> Self {
        Self {
            kind,
            detail,
            headers: HeaderMap::new(),
            source: None,
        }
    }

    fn message(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, ErrorDetail::Message(message.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::message(ApiErrorKind::BadRequest, message)
    }

    pub fn not_found() -> Self {
        Self::message(
            ApiErrorKind::NotFound,
            "the requested resource could not be found",
        )
    }

    pub fn method_not_allowed(method: &Method) -> Self {
        Self::message(
            ApiErrorKind::MethodNotAllowed,
            format!("the {} method is not supported for this resource", method),
        )
    }

    pub fn edit_conflict() -> Self {
        Self::message(
            ApiErrorKind::EditConflict,
            "unable to update the record due to an edit conflict, please try again",
        )
    }

    pub fn failed_validation(errors: ValidationErrors) -> Self {
        Self::new(ApiErrorKind::FailedValidation, ErrorDetail::Fields(errors))
    }

    /// A single-field validation failure
    pub fn field(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut v = Validator::new();
        v.add_error(key, message);
        v.into()
    }

    /// 429 with a `Retry-After` of at least one second
    pub fn rate_limited(retry_after: Duration) -> Self {
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        let mut error = Self::message(ApiErrorKind::RateLimited, "rate limit exceeded");
        error
            .headers
            .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        error
    }

    pub fn request_timeout() -> Self {
        Self::message(
            ApiErrorKind::RequestTimeout,
            "the server took too long to process your request",
        )
    }

    /// 500 carrying `source` for the log only
    pub fn internal(source: impl fmt::Display) -> Self {
        let mut error = Self::message(
            ApiErrorKind::Internal,
            "the server encountered a problem and could not process your request",
        );
        error.source = Some(source.to_string());
        error
    }

    /// Map a write failure, reporting a duplicate unique key against `key`
    pub fn from_write(err: RepositoryError, key: &str, message: &str) -> Self {
        if err.kind == RepositoryErrorKind::AlreadyExists {
            return Self::field(key, message);
        }
        err.into()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            ErrorDetail::Message(message) => write!(f, "API {} error: {}", self.kind, message),
            ErrorDetail::Fields(fields) => {
                write!(f, "API {} error on {} field(s)", self.kind, fields.len())
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                kind = %self.kind,
                source = self.source.as_deref().unwrap_or("unknown"),
                "Request failed"
            );
        } else {
            tracing::debug!(kind = %self.kind, "Request rejected");
        }

        let rendered = Envelope::wrap("error", &self.detail)
            .and_then(|envelope| write_json(status, &envelope, &self.headers));
        match rendered {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode error response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<Validator> for ApiError {
    fn from(v: Validator) -> Self {
        Self::failed_validation(v.into_errors())
    }
}

impl From<EncodeError> for ApiError {
    fn from(err: EncodeError) -> Self {
        Self::internal(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err.kind {
            RepositoryErrorKind::NotFound => Self::not_found(),
            RepositoryErrorKind::EditConflict => Self::edit_conflict(),
            _ => {
                if err.is_retriable() {
                    tracing::warn!(kind = %err.kind, "Transient storage failure, a retry may succeed");
                }
                Self::internal(err)
            }
        }
    }
}

//! HTTP handlers for the hotel resources
//!
//! Every resource follows the same collection pattern:
//!
//! | Operation | Method | Success |
//! |---|---|---|
//! | list   | `GET` collection      | 200 `{"<plural>": [...], "metadata": {...}}` |
//! | create | `POST` collection     | 201 `{"<singular>": {...}}` + `Location` |
//! | show   | `GET` item            | 200 `{"<singular>": {...}}` |
//! | update | `PUT` / `PATCH` item  | 200 `{"<singular>": {...}}` |
//! | delete | `DELETE` item         | 200 `{"message": "..."}` |
//!
//! Failures are [`ApiError`]s.

pub mod error;
pub mod guests;
pub mod health;
pub mod metrics;
pub mod params;
pub mod room_types;
pub mod rooms;

pub use error::{ApiError, ApiErrorKind, ErrorDetail};

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

use crate::codec::{write_json, Envelope};

/// Write `envelope` with no extra headers
pub(crate) fn respond(status: StatusCode, envelope: &Envelope) -> Result<Response, ApiError> {
    respond_with(status, envelope, &HeaderMap::new())
}

pub(crate) fn respond_with(
    status: StatusCode,
    envelope: &Envelope,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    Ok(write_json(status, envelope, headers)?)
}

/// `Location` header for a newly created resource
///
/// Left out when `path` is not a valid header value.
pub(crate) fn location(path: String) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match HeaderValue::try_from(path) {
        Ok(value) => {
            headers.insert(header::LOCATION, value);
        }
        Err(e) => tracing::warn!(error = %e, "Location header omitted"),
    }
    headers
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::{
        body::Body,
        http::{header, HeaderMap, Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{config::Config, routes::router, state::AppState};

    /// Router over empty in-memory repositories with rate limiting off
    pub(crate) fn app() -> Router {
        let mut config = Config::default();
        config.limiter.enabled = false;
        router(AppState::in_memory(config).unwrap())
    }

    pub(crate) async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header(header::CONTENT_TYPE, "application/json");
        }
        let request = request
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_header() {
        let headers = location("/v1/rooms/7".to_string());
        assert_eq!(headers[header::LOCATION], "/v1/rooms/7");

        let headers = location("/v1/guests/\n".to_string());
        assert!(headers.get(header::LOCATION).is_none());
    }
}

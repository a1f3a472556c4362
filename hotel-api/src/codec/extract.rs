//! Axum extractor for strictly decoded JSON bodies

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use super::decode::read_json;
use crate::{handlers::ApiError, state::AppState};

/// Request body decoded with [`read_json`] under the configured body limit
///
/// Rejects with a 400 [`ApiError`] carrying the [`DecodeError`](super::DecodeError)
/// message.
#[derive(Debug, Clone)]
pub struct StrictJson<T>(pub T);

impl<T> FromRequest<AppState> for StrictJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let limit = state.config().middleware.max_body_bytes;
        let value = read_json(req.into_body(), limit).await?;
        Ok(Self(value))
    }
}

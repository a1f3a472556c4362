//! Health check handler

use axum::{extract::State, http::StatusCode, response::Response};
use serde::{Deserialize, Serialize};

use super::{respond, ApiError};
use crate::{codec::Envelope, state::AppState};

/// Build details reported by the health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: String,
}

/// Liveness probe
///
/// Answers 200 whenever the process is serving requests; storage is not
/// consulted.
pub async fn healthcheck(State(state): State<AppState>) -> Result<Response, ApiError> {
    let info = SystemInfo {
        environment: state.config().service.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    respond(
        StatusCode::OK,
        &Envelope::wrap("status", "available")?.with("system_info", info)?,
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::handlers::testing::{app, send};

    #[tokio::test]
    async fn test_healthcheck() {
        let (status, _, body) = send(&app(), Method::GET, "/v1/healthcheck", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "available",
                "system_info": {
                    "environment": "development",
                    "version": env!("CARGO_PKG_VERSION")
                }
            })
        );
    }
}

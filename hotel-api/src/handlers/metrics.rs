//! Runtime metrics handler

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use sqlx::PgPool;

use super::{respond, ApiError};
use crate::{codec::Envelope, state::AppState};

/// Tokio scheduler counters
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStats {
    pub workers: usize,
    pub alive_tasks: usize,
}

impl RuntimeStats {
    fn current() -> Self {
        let metrics = tokio::runtime::Handle::current().metrics();
        Self {
            workers: metrics.num_workers(),
            alive_tasks: metrics.num_alive_tasks(),
        }
    }
}

/// Connection pool occupancy
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
    pub max_size: u32,
}

impl PoolStats {
    fn from_pool(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
            max_size: pool.options().get_max_connections(),
        }
    }
}

/// Process counters for operators
///
/// `database` is `null` when running on in-memory storage and
/// `rate_limiter` is `null` when limiting is disabled.
pub async fn debug_vars(State(state): State<AppState>) -> Result<Response, ApiError> {
    let database = state.pool().map(PoolStats::from_pool);
    let tracked_clients = state
        .rate_limiter()
        .map(|limiter| serde_json::json!({ "tracked_clients": limiter.tracked_clients() }));

    respond(
        StatusCode::OK,
        &Envelope::wrap("version", env!("CARGO_PKG_VERSION"))?
            .with("timestamp", chrono::Utc::now().timestamp())?
            .with("runtime", RuntimeStats::current())?
            .with("database", database)?
            .with("rate_limiter", tracked_clients)?,
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::Value;

    use crate::{
        config::Config,
        handlers::testing::{app, send},
        routes::router,
        state::AppState,
    };

    #[tokio::test]
    async fn test_debug_vars_in_memory() {
        let before = chrono::Utc::now().timestamp();
        let (status, _, body) = send(&app(), Method::GET, "/debug/vars", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].as_i64().unwrap() >= before);
        assert!(body["runtime"]["workers"].as_u64().unwrap() >= 1);
        assert!(body["runtime"]["alive_tasks"].is_u64());
        assert_eq!(body["database"], Value::Null);
        assert_eq!(body["rate_limiter"], Value::Null);
    }

    #[tokio::test]
    async fn test_debug_vars_counts_limited_clients() {
        let app = router(AppState::in_memory(Config::default()).unwrap());

        let (status, _, body) = send(&app, Method::GET, "/debug/vars", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rate_limiter"]["tracked_clients"], 1);
    }

    #[tokio::test]
    async fn test_debug_vars_is_read_only() {
        let (status, _, _) = send(&app(), Method::POST, "/debug/vars", Some("{}")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}

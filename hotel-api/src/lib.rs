//! # hotel-api
//!
//! JSON HTTP API for a hotel's guests, rooms and room types.
//!
//! ## Features
//!
//! - **Strict JSON codec**: size-limited reads, unknown-key rejection, one value per body
//! - **Validation**: field-keyed error maps answered as 422
//! - **Lists**: pagination, safelisted sorting and full-text filters
//! - **Partial updates**: tri-state patch fields, re-validated after merging
//! - **Storage**: PostgreSQL (sqlx) with optimistic locking, or in-memory
//! - **Middleware**: per-client rate limiting, panic recovery, request ids
//! - **Graceful shutdown**: SIGTERM and SIGINT with a bounded grace period
//!
//! ## Example
//!
//! ```rust,no_run
//! use hotel_api::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::in_memory(config)?;
//!     Server::new(state).serve().await
//! }
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod patch;
pub mod repository;
pub mod routes;
pub mod server;
pub mod state;
pub mod validator;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, ConfigOverrides};
    pub use crate::database::create_pool;
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind};
    pub use crate::observability::init_tracing;
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::state::AppState;
}

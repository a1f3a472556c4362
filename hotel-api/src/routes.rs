//! Route table
//!
//! ```text
//! GET                /v1/healthcheck
//! GET                /debug/vars
//! GET, POST          /v1/guests
//! GET, PUT, PATCH,   /v1/guests/{passport}
//!   DELETE
//! GET, POST          /v1/rooms
//! GET, PUT, PATCH,   /v1/rooms/{id}
//!   DELETE
//! GET, POST          /v1/room-types
//! GET, PUT, PATCH,   /v1/room-types/{id}
//!   DELETE
//! ```
//!
//! Unknown paths answer 404 and known paths with the wrong method answer 405,
//! both with the JSON error body. Every route, fallbacks included, sits behind
//! the per-client rate limiter.

use axum::{http::Method, middleware, routing::get, Router};

use crate::{
    handlers::{guests, health, metrics, room_types, rooms, ApiError},
    middleware::rate_limit,
    state::AppState,
};

/// Build the application router over `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(health::healthcheck))
        .route("/debug/vars", get(metrics::debug_vars))
        .route(
            "/v1/guests",
            get(guests::list_guests).post(guests::create_guest),
        )
        .route(
            "/v1/guests/{passport}",
            get(guests::show_guest)
                .put(guests::update_guest)
                .patch(guests::update_guest)
                .delete(guests::delete_guest),
        )
        .route("/v1/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/v1/rooms/{id}",
            get(rooms::show_room)
                .put(rooms::update_room)
                .patch(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route(
            "/v1/room-types",
            get(room_types::list_room_types).post(room_types::create_room_type),
        )
        .route(
            "/v1/room-types/{id}",
            get(room_types::show_room_type)
                .put(room_types::update_room_type)
                .patch(room_types::update_room_type)
                .delete(room_types::delete_room_type),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(&method)
}

//! Room type endpoints

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};

use super::{location, respond, respond_with, ApiError};
use crate::{
    codec::{read_json, Envelope, StrictJson},
    filters::validate_filters,
    handlers::params::{read_id_param, QueryParams},
    models::{room_type_filters, validate_room_type, RoomTypeFields, RoomTypePatch, RoomTypeSearch},
    state::AppState,
    validator::Validator,
};

const DUPLICATE_TITLE: &str = "a room type with this title already exists";

pub async fn list_room_types(
    State(state): State<AppState>,
    Query(qs): Query<QueryParams>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    let search = RoomTypeSearch::from_query(&qs);
    let filters = room_type_filters(&qs, &mut v);
    validate_filters(&mut v, &filters);
    if !v.valid() {
        return Err(v.into());
    }

    let (room_types, metadata) = state.room_types().list(&search, &filters).await?;
    respond(
        StatusCode::OK,
        &Envelope::wrap("room_types", &room_types)?.with("metadata", metadata)?,
    )
}

pub async fn create_room_type(
    State(state): State<AppState>,
    StrictJson(fields): StrictJson<RoomTypeFields>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    validate_room_type(&mut v, &fields);
    if !v.valid() {
        return Err(v.into());
    }

    let room_type = state
        .room_types()
        .insert(fields)
        .await
        .map_err(|e| ApiError::from_write(e, "title", DUPLICATE_TITLE))?;

    let headers = location(format!("/v1/room-types/{}", room_type.id));
    respond_with(
        StatusCode::CREATED,
        &Envelope::wrap("room_type", &room_type)?,
        &headers,
    )
}

pub async fn show_room_type(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = read_id_param(&raw_id).ok_or_else(ApiError::not_found)?;
    let room_type = state.room_types().find(&id).await?;
    respond(StatusCode::OK, &Envelope::wrap("room_type", &room_type)?)
}

pub async fn update_room_type(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Body,
) -> Result<Response, ApiError> {
    let id = read_id_param(&raw_id).ok_or_else(ApiError::not_found)?;
    let mut room_type = state.room_types().find(&id).await?;

    let patch: RoomTypePatch = read_json(body, state.config().middleware.max_body_bytes).await?;
    let mut v = Validator::new();
    patch.merge_into(&mut room_type.fields, &mut v);
    validate_room_type(&mut v, &room_type.fields);
    if !v.valid() {
        return Err(v.into());
    }

    state
        .room_types()
        .update(&mut room_type)
        .await
        .map_err(|e| ApiError::from_write(e, "title", DUPLICATE_TITLE))?;
    respond(StatusCode::OK, &Envelope::wrap("room_type", &room_type)?)
}

pub async fn delete_room_type(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = read_id_param(&raw_id).ok_or_else(ApiError::not_found)?;
    state.room_types().delete(&id).await?;
    respond(
        StatusCode::OK,
        &Envelope::wrap("message", "room type successfully deleted")?,
    )
}

//! Room endpoints

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
    models::{room_filters, validate_room, RoomFields, RoomPatch, RoomSearch},
    state::AppState,
    validator::Validator,
};

const DUPLICATE_NUMBER: &str = "a room with this number already exists";

pub async fn list_rooms(
    State(state): State<AppState>,
    Query(qs): Query<QueryParams>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    let search = RoomSearch::from_query(&qs, &mut v);
    let filters = room_filters(&qs, &mut v);
    validate_filters(&mut v, &filters);
    if !v.valid() {
        return Err(v.into());
    }

    let (rooms, metadata) = state.rooms().list(&search, &filters).await?;
    respond(
        StatusCode::OK,
        &Envelope::wrap("rooms", &rooms)?.with("metadata", metadata)?,
    )
}

pub async fn create_room(
    State(state): State<AppState>,
    StrictJson(fields): StrictJson<RoomFields>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    validate_room(&mut v, &fields);
    if !v.valid() {
        return Err(v.into());
    }

    let room = state
        .rooms()
        .insert(fields)
        .await
        .map_err(|e| ApiError::from_write(e, "room_number", DUPLICATE_NUMBER))?;

    let headers = location(format!("/v1/rooms/{}", room.id));
    respond_with(StatusCode::CREATED, &Envelope::wrap("room", &room)?, &headers)
}

pub async fn show_room(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = read_id_param(&raw_id).ok_or_else(ApiError::not_found)?;
    let room = state.rooms().find(&id).await?;
    respond(StatusCode::OK, &Envelope::wrap("room", &room)?)
}

pub async fn update_room(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Body,
) -> Result<Response, ApiError> {
    let id = read_id_param(&raw_id).ok_or_else(ApiError::not_found)?;
    let mut room = state.rooms().find(&id).await?;

    let patch: RoomPatch = read_json(body, state.config().middleware.max_body_bytes).await?;
    let mut v = Validator::new();
    patch.merge_into(&mut room.fields, &mut v);
    validate_room(&mut v, &room.fields);
    if !v.valid() {
        return Err(v.into());
    }

    state
        .rooms()
        .update(&mut room)
        .await
        .map_err(|e| ApiError::from_write(e, "room_number", DUPLICATE_NUMBER))?;
    respond(StatusCode::OK, &Envelope::wrap("room", &room)?)
}

pub async fn delete_room(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = read_id_param(&raw_id).ok_or_else(ApiError::not_found)?;
    state.rooms().delete(&id).await?;
    respond(
        StatusCode::OK,
        &Envelope::wrap("message", "room successfully deleted")?,
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    use crate::handlers::testing::{app, send};

    fn room(number: i32, room_type: &str, available: bool) -> String {
        json!({
            "room_number": number,
            "room_type": room_type,
            "max_occupancy": 2,
            "has_balcony": false,
            "available": available
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_and_show_room() {
        let app = app();

        let (status, headers, body) =
            send(&app, Method::POST, "/v1/rooms", Some(&room(101, "Double", true))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[header::LOCATION], "/v1/rooms/1");
        assert_eq!(body["room"]["id"], 1);
        assert_eq!(body["room"]["room_number"], 101);
        assert!(body["room"].get("created_at").is_none());

        let (status, _, body) = send(&app, Method::GET, "/v1/rooms/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["room"]["room_type"], "Double");
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_found() {
        let app = app();
        for uri in ["/v1/rooms/0", "/v1/rooms/-3", "/v1/rooms/abc", "/v1/rooms/99"] {
            let (status, _, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], "the requested resource could not be found");
        }
    }

    #[tokio::test]
    async fn test_create_room_validation() {
        let app = app();
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/v1/rooms",
            Some(r#"{"room_number": -1, "max_occupancy": 0}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"],
            json!({
                "room_number": "Room number must be a positive number",
                "max_occupancy": "Max occupancy must be a positive number",
                "room_type": "must be provided"
            })
        );
    }

    #[tokio::test]
    async fn test_create_room_type_mismatch() {
        let app = app();
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/v1/rooms",
            Some(r#"{"room_number": "101"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Body contains incorrect JSON type for field \"room_number\""
        );
    }

    #[tokio::test]
    async fn test_update_to_taken_number() {
        let app = app();
        send(&app, Method::POST, "/v1/rooms", Some(&room(101, "Double", true))).await;
        send(&app, Method::POST, "/v1/rooms", Some(&room(102, "Double", true))).await;

        let (status, _, body) = send(
            &app,
            Method::PATCH,
            "/v1/rooms/2",
            Some(r#"{"room_number": 101}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"]["room_number"],
            "a room with this number already exists"
        );

        let (status, _, body) = send(
            &app,
            Method::PATCH,
            "/v1/rooms/2",
            Some(r#"{"available": false}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["room"]["available"], false);
        assert_eq!(body["room"]["room_number"], 102);
    }

    #[tokio::test]
    async fn test_update_rejects_trailing_json() {
        let app = app();
        send(&app, Method::POST, "/v1/rooms", Some(&room(101, "Double", true))).await;

        let (status, _, body) = send(
            &app,
            Method::PUT,
            "/v1/rooms/1",
            Some(r#"{"available": false} {"available": true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Body must only contain a single JSON value");
    }

    #[tokio::test]
    async fn test_list_rooms_filters() {
        let app = app();
        send(&app, Method::POST, "/v1/rooms", Some(&room(301, "Family Suite", true))).await;
        send(&app, Method::POST, "/v1/rooms", Some(&room(101, "Double", true))).await;
        send(&app, Method::POST, "/v1/rooms", Some(&room(201, "Double", false))).await;

        let (status, _, body) = send(
            &app,
            Method::GET,
            "/v1/rooms?room_type=double&available=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rooms"].as_array().unwrap().len(), 1);
        assert_eq!(body["rooms"][0]["room_number"], 101);

        let (_, _, body) = send(&app, Method::GET, "/v1/rooms?sort=-room_number&page_size=2", None).await;
        assert_eq!(body["rooms"][0]["room_number"], 301);
        assert_eq!(body["rooms"][1]["room_number"], 201);
        assert_eq!(
            body["metadata"],
            json!({
                "current_page": 1,
                "page_size": 2,
                "first_page": 1,
                "last_page": 2,
                "total_records": 3
            })
        );

        let (status, _, body) = send(&app, Method::GET, "/v1/rooms?available=maybe", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["available"], "must be a boolean value");
    }

    #[tokio::test]
    async fn test_empty_page_has_empty_metadata() {
        let app = app();
        let (status, _, body) = send(&app, Method::GET, "/v1/rooms", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"rooms": [], "metadata": {}}));
    }

    #[tokio::test]
    async fn test_delete_room() {
        let app = app();
        send(&app, Method::POST, "/v1/rooms", Some(&room(101, "Double", true))).await;

        let (status, _, body) = send(&app, Method::DELETE, "/v1/rooms/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "room successfully deleted"}));

        let (status, _, _) = send(&app, Method::GET, "/v1/rooms/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

//! Guest endpoints, keyed by passport number

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
    handlers::params::QueryParams,
    models::{guest_filters, validate_guest, GuestFields, GuestPatch, GuestSearch},
    state::AppState,
    validator::Validator,
};

const DUPLICATE_PASSPORT: &str = "a guest with this passport number already exists";

pub async fn list_guests(
    State(state): State<AppState>,
    Query(qs): Query<QueryParams>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    let search = GuestSearch::from_query(&qs);
    let filters = guest_filters(&qs, &mut v);
    validate_filters(&mut v, &filters);
    if !v.valid() {
        return Err(v.into());
    }

    let (guests, metadata) = state.guests().list(&search, &filters).await?;
    respond(
        StatusCode::OK,
        &Envelope::wrap("guests", &guests)?.with("metadata", metadata)?,
    )
}

pub async fn create_guest(
    State(state): State<AppState>,
    StrictJson(fields): StrictJson<GuestFields>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    validate_guest(&mut v, &fields);
    if !v.valid() {
        return Err(v.into());
    }

    let guest = state
        .guests()
        .insert(fields)
        .await
        .map_err(|e| ApiError::from_write(e, "passport_number", DUPLICATE_PASSPORT))?;

    tracing::debug!(id = guest.id, "Guest created");
    let headers = location(format!("/v1/guests/{}", guest.fields.passport_number));
    respond_with(
        StatusCode::CREATED,
        &Envelope::wrap("guest", &guest)?,
        &headers,
    )
}

pub async fn show_guest(
    State(state): State<AppState>,
    Path(passport): Path<String>,
) -> Result<Response, ApiError> {
    let guest = state.guests().find(&passport).await?;
    respond(StatusCode::OK, &Envelope::wrap("guest", &guest)?)
}

/// Apply a partial update
///
/// The stored guest is loaded before the body is read; the merged result is
/// validated as a whole before it is written back.
pub async fn update_guest(
    State(state): State<AppState>,
    Path(passport): Path<String>,
    body: Body,
) -> Result<Response, ApiError> {
    let mut guest = state.guests().find(&passport).await?;

    let patch: GuestPatch = read_json(body, state.config().middleware.max_body_bytes).await?;
    let mut v = Validator::new();
    patch.merge_into(&mut guest.fields, &mut v);
    validate_guest(&mut v, &guest.fields);
    if !v.valid() {
        return Err(v.into());
    }

    state.guests().update(&mut guest).await?;
    respond(StatusCode::OK, &Envelope::wrap("guest", &guest)?)
}

pub async fn delete_guest(
    State(state): State<AppState>,
    Path(passport): Path<String>,
) -> Result<Response, ApiError> {
    state.guests().delete(&passport).await?;
    respond(
        StatusCode::OK,
        &Envelope::wrap("message", "guest successfully deleted")?,
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    use crate::handlers::testing::{app, send};

    const ALICE: &str = r#"{
        "passport_number": "P1234567",
        "contact_email": "alice@example.com",
        "contact_phone": "+44 20 7946 0000",
        "name": "Alice Smith",
        "gender": "female",
        "street": "1 High Street",
        "city": "London",
        "country": "United Kingdom"
    }"#;

    #[tokio::test]
    async fn test_create_and_show_guest() {
        let app = app();

        let (status, headers, body) = send(&app, Method::POST, "/v1/guests", Some(ALICE)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[header::LOCATION], "/v1/guests/P1234567");
        assert_eq!(body["guest"]["name"], "Alice Smith");
        assert!(body["guest"].get("id").is_none());
        assert!(body["guest"].get("version").is_none());

        let (status, _, body) = send(&app, Method::GET, "/v1/guests/P1234567", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["guest"]["contact_email"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_create_guest_validation() {
        let app = app();

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/v1/guests",
            Some(r#"{"name": "Bob", "contact_email": "not-an-email"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"],
            json!({
                "passport_number": "must be provided",
                "contact_email": "must be a valid email address"
            })
        );
    }

    #[tokio::test]
    async fn test_create_guest_rejects_unknown_field() {
        let app = app();

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/v1/guests",
            Some(r#"{"passport_number": "P1", "vip": true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Body contains unknown key \"vip\"");
    }

    #[tokio::test]
    async fn test_duplicate_passport() {
        let app = app();
        send(&app, Method::POST, "/v1/guests", Some(ALICE)).await;

        let (status, _, body) = send(&app, Method::POST, "/v1/guests", Some(ALICE)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"]["passport_number"],
            "a guest with this passport number already exists"
        );
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let app = app();
        send(&app, Method::POST, "/v1/guests", Some(ALICE)).await;

        let (status, _, body) = send(
            &app,
            Method::PATCH,
            "/v1/guests/P1234567",
            Some(r#"{"city": "Leeds"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["guest"]["city"], "Leeds");
        assert_eq!(body["guest"]["name"], "Alice Smith");
        assert_eq!(body["guest"]["passport_number"], "P1234567");
    }

    #[tokio::test]
    async fn test_update_rejects_null_and_passport_change() {
        let app = app();
        send(&app, Method::POST, "/v1/guests", Some(ALICE)).await;

        let (status, _, body) = send(
            &app,
            Method::PUT,
            "/v1/guests/P1234567",
            Some(r#"{"name": null}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["name"], "must not be null");

        let (status, _, _) = send(
            &app,
            Method::PATCH,
            "/v1/guests/P1234567",
            Some(r#"{"passport_number": "X9"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_missing_guest_is_not_found() {
        let app = app();
        let (status, _, _) = send(
            &app,
            Method::PATCH,
            "/v1/guests/NOPE",
            Some(r#"{"city": "Leeds"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_guest() {
        let app = app();
        send(&app, Method::POST, "/v1/guests", Some(ALICE)).await;

        let (status, _, body) = send(&app, Method::DELETE, "/v1/guests/P1234567", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "guest successfully deleted"}));

        let (status, _, body) = send(&app, Method::DELETE, "/v1/guests/P1234567", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "the requested resource could not be found");
    }

    #[tokio::test]
    async fn test_list_guests_search_and_sort() {
        let app = app();
        for (passport, name, country) in [
            ("A1", "Zoe Park", "Canada"),
            ("B2", "Adam Park", "Canada"),
            ("C3", "Mia Lund", "Sweden"),
        ] {
            let body = json!({"passport_number": passport, "name": name, "country": country});
            send(&app, Method::POST, "/v1/guests", Some(&body.to_string())).await;
        }

        let (status, _, body) =
            send(&app, Method::GET, "/v1/guests?country=canada&sort=-name", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body["guests"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Zoe Park", "Adam Park"]);
        assert_eq!(body["metadata"]["total_records"], 2);
    }

    #[tokio::test]
    async fn test_list_guests_bad_filters() {
        let app = app();
        let (status, _, body) = send(
            &app,
            Method::GET,
            "/v1/guests?page=abc&page_size=500&sort=country",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["page"], "must be an integer value");
        assert_eq!(body["error"]["page_size"], "Must be a maximum of 100");
        assert_eq!(body["error"]["sort"], "Invalid sort value");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::Filters;
use crate::handlers::params::{read_bool, read_string, QueryParams};
use crate::patch::Patch;
use crate::validator::Validator;

pub const ROOM_DEFAULT_SORT: &str = "id";

pub const ROOM_SORT_SAFELIST: &[&str] = &[
    "id",
    "room_number",
    "max_occupancy",
    "-id",
    "-room_number",
    "-max_occupancy",
];

/// Client-supplied room attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default, deny_unknown_fields)]
pub struct RoomFields {
    pub room_number: i32,
    pub room_type: String,
    pub max_occupancy: i32,
    pub has_balcony: bool,
    pub available: bool,
}

/// A stored room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: RoomFields,
    #[serde(skip)]
    pub version: i32,
}

pub fn validate_room(v: &mut Validator, room: &RoomFields) {
    v.check(
        room.room_number > 0,
        "room_number",
        "Room number must be a positive number",
    );
    v.check(
        room.max_occupancy > 0,
        "max_occupancy",
        "Max occupancy must be a positive number",
    );
    v.check(!room.room_type.is_empty(), "room_type", "must be provided");
}

/// Partial update of a room
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoomPatch {
    pub room_number: Patch<i32>,
    pub room_type: Patch<String>,
    pub max_occupancy: Patch<i32>,
    pub has_balcony: Patch<bool>,
    pub available: Patch<bool>,
}

impl RoomPatch {
    pub fn merge_into(self, room: &mut RoomFields, v: &mut Validator) {
        self.room_number
            .merge_into(&mut room.room_number, "room_number", v);
        self.room_type.merge_into(&mut room.room_type, "room_type", v);
        self.max_occupancy
            .merge_into(&mut room.max_occupancy, "max_occupancy", v);
        self.has_balcony
            .merge_into(&mut room.has_balcony, "has_balcony", v);
        self.available.merge_into(&mut room.available, "available", v);
    }
}

/// Filters for the room list
///
/// `room_type` is a full-text match; `available` is exact when given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSearch {
    pub room_type: String,
    pub available: Option<bool>,
}

impl RoomSearch {
    pub fn from_query(qs: &QueryParams, v: &mut Validator) -> Self {
        Self {
            room_type: read_string(qs, "room_type", ""),
            available: read_bool(qs, "available", v),
        }
    }
}

pub fn room_filters(qs: &QueryParams, v: &mut Validator) -> Filters {
    Filters::from_query(qs, ROOM_DEFAULT_SORT, ROOM_SORT_SAFELIST, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_json, DecodeError};

    fn sample() -> RoomFields {
        RoomFields {
            room_number: 101,
            room_type: "Deluxe Double".to_string(),
            max_occupancy: 2,
            has_balcony: true,
            available: true,
        }
    }

    #[test]
    fn test_validate_room() {
        let mut v = Validator::new();
        validate_room(&mut v, &sample());
        assert!(v.valid());

        let mut v = Validator::new();
        validate_room(&mut v, &RoomFields::default());
        assert_eq!(v.errors()["room_number"], "Room number must be a positive number");
        assert_eq!(
            v.errors()["max_occupancy"],
            "Max occupancy must be a positive number"
        );
        assert_eq!(v.errors()["room_type"], "must be provided");
    }

    #[test]
    fn test_serialized_room_shows_id_only() {
        let room = Room {
            id: 4,
            created_at: Utc::now(),
            fields: sample(),
            version: 1,
        };
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["room_number"], 101);
        assert!(json.get("created_at").is_none());
        assert!(json.get("version").is_none());
    }

    #[test]
    fn test_wrong_type_names_the_field() {
        let err = decode_json::<RoomFields>(br#"{"room_number": "101"}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TypeMismatch { field: Some(ref f), .. } if f == "room_number"
        ));
    }

    #[test]
    fn test_patch_then_revalidate() {
        let patch: RoomPatch = decode_json(br#"{"max_occupancy": 0}"#).unwrap();
        let mut room = sample();
        let mut v = Validator::new();
        patch.merge_into(&mut room, &mut v);
        assert!(v.valid());

        validate_room(&mut v, &room);
        assert_eq!(
            v.errors()["max_occupancy"],
            "Max occupancy must be a positive number"
        );
    }

    #[test]
    fn test_search_reads_available() {
        let qs: QueryParams = [
            ("available".to_string(), "false".to_string()),
            ("room_type".to_string(), "suite".to_string()),
        ]
        .into_iter()
        .collect();
        let mut v = Validator::new();
        let search = RoomSearch::from_query(&qs, &mut v);
        assert!(v.valid());
        assert_eq!(search.available, Some(false));
        assert_eq!(search.room_type, "suite");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::Filters;
use crate::handlers::params::{read_string, QueryParams};
use crate::patch::Patch;
use crate::validator::Validator;

pub const ROOM_TYPE_DEFAULT_SORT: &str = "id";

pub const ROOM_TYPE_SORT_SAFELIST: &[&str] = &["id", "title", "base_rate", "-id", "-title", "-base_rate"];

/// Client-supplied room type attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default, deny_unknown_fields)]
pub struct RoomTypeFields {
    pub title: String,
    pub base_rate: f64,
    pub max_occupancy: i32,
    pub bed_count: i32,
    pub has_balcony: bool,
}

/// A stored room type
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RoomType {
    pub id: i64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: RoomTypeFields,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i32,
}

pub fn validate_room_type(v: &mut Validator, rt: &RoomTypeFields) {
    v.check(!rt.title.is_empty(), "title", "must be provided");
    v.check(rt.base_rate > 0.0, "base_rate", "must be greater than 0");
    v.check(rt.max_occupancy > 0, "max_occupancy", "must be greater than 0");
    v.check(rt.bed_count > 0, "bed_count", "must be greater than 0");
}

/// Partial update of a room type
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoomTypePatch {
    pub title: Patch<String>,
    pub base_rate: Patch<f64>,
    pub max_occupancy: Patch<i32>,
    pub bed_count: Patch<i32>,
    pub has_balcony: Patch<bool>,
}

impl RoomTypePatch {
    pub fn merge_into(self, rt: &mut RoomTypeFields, v: &mut Validator) {
        self.title.merge_into(&mut rt.title, "title", v);
        self.base_rate.merge_into(&mut rt.base_rate, "base_rate", v);
        self.max_occupancy
            .merge_into(&mut rt.max_occupancy, "max_occupancy", v);
        self.bed_count.merge_into(&mut rt.bed_count, "bed_count", v);
        self.has_balcony
            .merge_into(&mut rt.has_balcony, "has_balcony", v);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomTypeSearch {
    pub title: String,
}

impl RoomTypeSearch {
    pub fn from_query(qs: &QueryParams) -> Self {
        Self {
            title: read_string(qs, "title", ""),
        }
    }
}

pub fn room_type_filters(qs: &QueryParams, v: &mut Validator) -> Filters {
    Filters::from_query(qs, ROOM_TYPE_DEFAULT_SORT, ROOM_TYPE_SORT_SAFELIST, v)
}

//! Guests, keyed by passport number
//!
//! A guest is stored across the `person` and `guest` tables; the split is a
//! storage detail and never reaches the JSON shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::Filters;
use crate::handlers::params::{read_string, QueryParams};
use crate::patch::Patch;
use crate::validator::{matches, Validator, EMAIL_RX};

pub const GUEST_DEFAULT_SORT: &str = "passport_number";

pub const GUEST_SORT_SAFELIST: &[&str] = &[
    "passport_number",
    "name",
    "created_at",
    "-passport_number",
    "-name",
    "-created_at",
];

/// Client-supplied guest attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default, deny_unknown_fields)]
pub struct GuestFields {
    pub passport_number: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub name: String,
    pub gender: String,
    pub street: String,
    pub city: String,
    pub country: String,
}

/// A stored guest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Guest {
    #[serde(skip)]
    pub id: i64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: GuestFields,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i32,
}

pub fn validate_guest(v: &mut Validator, guest: &GuestFields) {
    v.check(
        !guest.passport_number.is_empty(),
        "passport_number",
        "must be provided",
    );
    if !guest.contact_email.is_empty() {
        v.check(
            matches(&guest.contact_email, &EMAIL_RX),
            "contact_email",
            "must be a valid email address",
        );
    }
}

/// Partial update of a guest; the passport number is the key and cannot change
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuestPatch {
    pub contact_email: Patch<String>,
    pub contact_phone: Patch<String>,
    pub name: Patch<String>,
    pub gender: Patch<String>,
    pub street: Patch<String>,
    pub city: Patch<String>,
    pub country: Patch<String>,
}

impl GuestPatch {
    /// Overlay the fields present in the patch onto `guest`
    pub fn merge_into(self, guest: &mut GuestFields, v: &mut Validator) {
        self.contact_email
            .merge_into(&mut guest.contact_email, "contact_email", v);
        self.contact_phone
            .merge_into(&mut guest.contact_phone, "contact_phone", v);
        self.name.merge_into(&mut guest.name, "name", v);
        self.gender.merge_into(&mut guest.gender, "gender", v);
        self.street.merge_into(&mut guest.street, "street", v);
        self.city.merge_into(&mut guest.city, "city", v);
        self.country.merge_into(&mut guest.country, "country", v);
    }
}

/// Full-text filters for the guest list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestSearch {
    pub name: String,
    pub country: String,
}

impl GuestSearch {
    pub fn from_query(qs: &QueryParams) -> Self {
        Self {
            name: read_string(qs, "name", ""),
            country: read_string(qs, "country", ""),
        }
    }
}

/// Read the list filters for guests from the query string
pub fn guest_filters(qs: &QueryParams, v: &mut Validator) -> Filters {
    Filters::from_query(qs, GUEST_DEFAULT_SORT, GUEST_SORT_SAFELIST, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_json;

    fn sample() -> GuestFields {
        GuestFields {
            passport_number: "P1234567".to_string(),
            contact_email: "maria@example.com".to_string(),
            contact_phone: "+501 600 0000".to_string(),
            name: "Maria Chan".to_string(),
            gender: "F".to_string(),
            street: "12 Regent St".to_string(),
            city: "Belize City".to_string(),
            country: "Belize".to_string(),
        }
    }

    #[test]
    fn test_validate_requires_passport() {
        let mut v = Validator::new();
        validate_guest(&mut v, &GuestFields::default());
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["passport_number"], "must be provided");
    }

    #[test]
    fn test_validate_email_only_when_present() {
        let mut v = Validator::new();
        validate_guest(&mut v, &sample());
        assert!(v.valid());

        let mut guest = sample();
        guest.contact_email = "not-an-email".to_string();
        let mut v = Validator::new();
        validate_guest(&mut v, &guest);
        assert_eq!(v.errors()["contact_email"], "must be a valid email address");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let fields: GuestFields = decode_json(br#"{"passport_number": "X1"}"#).unwrap();
        assert_eq!(fields.passport_number, "X1");
        assert_eq!(fields.name, "");
    }

    #[test]
    fn test_serialized_guest_hides_bookkeeping() {
        let guest = Guest {
            id: 9,
            fields: sample(),
            created_at: Utc::now(),
            version: 3,
        };
        let json = serde_json::to_value(&guest).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 8);
        assert_eq!(object["passport_number"], "P1234567");
        assert!(!object.contains_key("id"));
        assert!(!object.contains_key("created_at"));
        assert!(!object.contains_key("version"));
    }

    #[test]
    fn test_empty_patch_leaves_guest_unchanged() {
        let mut guest = sample();
        let mut v = Validator::new();
        GuestPatch::default().merge_into(&mut guest, &mut v);
        assert_eq!(guest, sample());
        assert!(v.valid());
    }

    #[test]
    fn test_patch_overwrites_only_present_fields() {
        let patch: GuestPatch =
            decode_json(br#"{"city": "San Ignacio", "contact_phone": ""}"#).unwrap();
        let mut guest = sample();
        let mut v = Validator::new();
        patch.merge_into(&mut guest, &mut v);

        assert!(v.valid());
        assert_eq!(guest.city, "San Ignacio");
        assert_eq!(guest.contact_phone, "");
        assert_eq!(guest.name, "Maria Chan");
    }

    #[test]
    fn test_patch_rejects_passport_number() {
        let err = decode_json::<GuestPatch>(br#"{"passport_number": "Z9"}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Body contains unknown key \"passport_number\""
        );
    }

    #[test]
    fn test_patch_null_is_reported() {
        let patch: GuestPatch = decode_json(br#"{"name": null}"#).unwrap();
        let mut guest = sample();
        let mut v = Validator::new();
        patch.merge_into(&mut guest, &mut v);
        assert_eq!(v.errors()["name"], "must not be null");
        assert_eq!(guest.name, "Maria Chan");
    }

    #[test]
    fn test_search_from_query() {
        let qs: QueryParams = [("name".to_string(), "maria".to_string())]
            .into_iter()
            .collect();
        let search = GuestSearch::from_query(&qs);
        assert_eq!(search.name, "maria");
        assert_eq!(search.country, "");
    }
}

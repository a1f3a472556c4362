//! Field presence for partial updates
//!
//! [`Patch`] tells apart a key that was never sent, a key sent as `null`,
//! and a key sent with a value. Declare fields with `#[serde(default)]` so a
//! missing key deserializes to [`Patch::Absent`].
//!
//! # Example
//!
//! ```rust
//! use hotel_api::patch::Patch;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Update {
//!     #[serde(default)]
//!     name: Patch<String>,
//!     #[serde(default)]
//!     city: Patch<String>,
//! }
//!
//! let update: Update = serde_json::from_str(r#"{"name": "Alice", "city": null}"#).unwrap();
//! assert_eq!(update.name, Patch::Value("Alice".to_string()));
//! assert_eq!(update.city, Patch::Null);
//!
//! let update: Update = serde_json::from_str("{}").unwrap();
//! assert!(update.name.is_absent());
//! ```

use serde::{Deserialize, Deserializer};

use crate::validator::Validator;

/// A field in a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key not present: leave the target unchanged
    Absent,
    /// Key present with `null`
    Null,
    /// Key present with a value
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Overwrite `target` when a value was sent
    ///
    /// `null` is recorded in `v` under `key`; the fields it applies to
    /// cannot be cleared.
    pub fn merge_into(self, target: &mut T, key: &str, v: &mut Validator) {
        match self {
            Patch::Absent => {}
            Patch::Null => v.add_error(key, "must not be null"),
            Patch::Value(value) => *target = value,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

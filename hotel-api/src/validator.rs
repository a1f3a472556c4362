//! Field-keyed validation
//!
//! A [`Validator`] collects at most one message per field. The first failure
//! recorded for a key wins; later checks against the same key are ignored.
//!
//! # Example
//!
//! ```rust
//! use hotel_api::validator::{matches, Validator, EMAIL_RX};
//!
//! let mut v = Validator::new();
//! v.check(!"".is_empty(), "title", "must be provided");
//! v.check(matches("guest@example.com", &EMAIL_RX), "contact_email", "must be a valid email address");
//!
//! assert!(!v.valid());
//! assert_eq!(v.errors().get("title").map(String::as_str), Some("must be provided"));
//! ```

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use once_cell::sync::Lazy;
use regex::Regex;

/// Email pattern from the WHATWG "valid e-mail address" definition
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap_or_else(|e| panic!("invalid email pattern: {e}"))
});

/// Field name to message, one message per field
pub type ValidationErrors = BTreeMap<String, String>;

/// Accumulates validation failures for a single request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    /// Create an empty validator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no failure has been recorded
    #[must_use]
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` under `key` unless the key already has one
    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(key.into())
            .or_insert_with(|| message.into());
    }

    /// Record `message` under `key` when `ok` is false
    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }

    /// Recorded failures
    #[must_use]
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Consume the validator, returning its failures
    #[must_use]
    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }
}

/// True when `value` is one of `permitted`
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True when `value` matches `rx`
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// True when every element of `values` is distinct
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let distinct: HashSet<&T> = values.iter().collect();
    distinct.len() == values.len()
}

//! Pagination, sorting and filtering for list endpoints
//!
//! A [`Filters`] value is built from the query string, validated with
//! [`validate_filters`], and only then handed to a repository. The sort key
//! must be a member of the resource's safelist; that membership check is
//! the only thing standing between user input and the `ORDER BY` clause.
//!
//! # Example
//!
//! ```rust
//! use hotel_api::filters::{validate_filters, Filters, SortOrder};
//! use hotel_api::validator::Validator;
//!
//! const SAFELIST: &[&str] = &["id", "title", "-id", "-title"];
//!
//! let filters = Filters::new(2, 20, "-title", SAFELIST);
//! let mut v = Validator::new();
//! validate_filters(&mut v, &filters);
//! assert!(v.valid());
//!
//! assert_eq!(filters.ordering(), ("title", SortOrder::Desc));
//! assert_eq!(filters.limit(), 20);
//! assert_eq!(filters.offset(), 20);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handlers::params::{read_int, read_string, QueryParams};
use crate::validator::{permitted_value, Validator};

/// Default page when `page` is not supplied
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when `page_size` is not supplied
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page number a client may request
pub const MAX_PAGE: i64 = 10_000_000;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Sort in ascending order (A-Z, 0-9, oldest first)
    #[default]
    Asc,
    /// Sort in descending order (Z-A, 9-0, newest first)
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl SortOrder {
    /// Convert to SQL ORDER BY clause fragment
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Requested page, page size and sort key for a list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    pub fn new(
        page: i64,
        page_size: i64,
        sort: impl Into<String>,
        sort_safelist: &'static [&'static str],
    ) -> Self {
        Self {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist,
        }
    }

    /// Read `page`, `page_size` and `sort` from the query string
    ///
    /// Unparsable numbers are recorded in `v` and replaced by their defaults.
    /// The result still has to go through [`validate_filters`].
    pub fn from_query(
        qs: &QueryParams,
        default_sort: &str,
        sort_safelist: &'static [&'static str],
        v: &mut Validator,
    ) -> Self {
        Self {
            page: read_int(qs, "page", DEFAULT_PAGE, v),
            page_size: read_int(qs, "page_size", DEFAULT_PAGE_SIZE, v),
            sort: read_string(qs, "sort", default_sort),
            sort_safelist,
        }
    }

    /// Column named by the sort key, without any leading `-`
    ///
    /// # Panics
    ///
    /// Panics if the sort key is not in the safelist. Callers must run
    /// [`validate_filters`] first; reaching this with an unsafe key is a bug
    /// in the caller, not bad client input.
    #[must_use]
    pub fn sort_column(&self) -> &str {
        if permitted_value(&self.sort.as_str(), self.sort_safelist) {
            return self.sort.trim_start_matches('-');
        }
        panic!("Unsafe sort parameter: {}", self.sort);
    }

    /// `Desc` when the sort key starts with `-`
    #[must_use]
    pub fn sort_direction(&self) -> SortOrder {
        if self.sort.starts_with('-') {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    /// Column and direction for the `ORDER BY` clause
    #[must_use]
    pub fn ordering(&self) -> (&str, SortOrder) {
        (self.sort_column(), self.sort_direction())
    }

    /// Rows per page
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Rows skipped before the requested page
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Record range and safelist failures for `f`
pub fn validate_filters(v: &mut Validator, f: &Filters) {
    v.check(f.page > 0, "page", "Must be greater than zero");
    v.check(f.page <= MAX_PAGE, "page", "Must be a maximum of 10 million");
    v.check(f.page_size > 0, "page_size", "Must be greater than zero");
    v.check(
        f.page_size <= MAX_PAGE_SIZE,
        "page_size",
        "Must be a maximum of 100",
    );
    v.check(
        permitted_value(&f.sort.as_str(), f.sort_safelist),
        "sort",
        "Invalid sort value",
    );
}

/// Pagination details for a list response
///
/// Every field is zero, and omitted from the JSON, when the query matched no
/// records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Derive page metadata from a total record count
pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records <= 0 || page_size <= 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: calculate_last_page(total_records, page_size),
        total_records,
    }
}

fn calculate_last_page(total: i64, page_size: i64) -> i64 {
    // Ceiling division
    total.saturating_add(page_size - 1) / page_size
}

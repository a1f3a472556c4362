//! Path and query-string readers
//!
//! The readers never fail a request on their own. Parse failures are
//! recorded in the caller's [`Validator`] and the default is returned, so a
//! single 422 response can report every bad parameter at once.

use std::collections::HashMap;

use crate::validator::Validator;

/// Decoded query-string pairs
pub type QueryParams = HashMap<String, String>;

/// Parse a numeric path id
///
/// Returns `None` for anything that is not an integer of at least 1; the
/// caller answers 404 in that case.
pub fn read_id_param(raw: &str) -> Option<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Some(id),
        _ => None,
    }
}

/// String value for `key`, or `default` when missing or empty
pub fn read_string(qs: &QueryParams, key: &str, default: &str) -> String {
    match qs.get(key) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => default.to_string(),
    }
}

/// Integer value for `key`, or `default` when missing or empty
pub fn read_int(qs: &QueryParams, key: &str, default: i64, v: &mut Validator) -> i64 {
    let raw = match qs.get(key) {
        Some(value) if !value.is_empty() => value,
        _ => return default,
    };

    match raw.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            v.add_error(key, "must be an integer value");
            default
        }
    }
}

/// Boolean value for `key`; `None` when missing, empty or unparsable
pub fn read_bool(qs: &QueryParams, key: &str, v: &mut Validator) -> Option<bool> {
    let raw = qs.get(key).filter(|value| !value.is_empty())?;

    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => {
            v.add_error(key, "must be a boolean value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_read_id_param() {
        assert_eq!(read_id_param("42"), Some(42));
        assert_eq!(read_id_param("1"), Some(1));
        assert_eq!(read_id_param("0"), None);
        assert_eq!(read_id_param("-3"), None);
        assert_eq!(read_id_param("abc"), None);
        assert_eq!(read_id_param(""), None);
        assert_eq!(read_id_param("99999999999999999999"), None);
    }

    #[test]
    fn test_read_string_defaults() {
        let qs = query(&[("name", "Smith"), ("country", "")]);
        assert_eq!(read_string(&qs, "name", ""), "Smith");
        assert_eq!(read_string(&qs, "country", "Belize"), "Belize");
        assert_eq!(read_string(&qs, "city", "Belmopan"), "Belmopan");
    }

    #[test]
    fn test_read_int() {
        let qs = query(&[("page", "3"), ("page_size", "ten"), ("empty", "")]);
        let mut v = Validator::new();

        assert_eq!(read_int(&qs, "page", 1, &mut v), 3);
        assert_eq!(read_int(&qs, "empty", 7, &mut v), 7);
        assert_eq!(read_int(&qs, "missing", 9, &mut v), 9);
        assert!(v.valid());

        assert_eq!(read_int(&qs, "page_size", 20, &mut v), 20);
        assert_eq!(v.errors()["page_size"], "must be an integer value");
    }

    #[test]
    fn test_read_bool() {
        let qs = query(&[("a", "true"), ("b", "F"), ("c", "1"), ("d", "maybe")]);
        let mut v = Validator::new();

        assert_eq!(read_bool(&qs, "a", &mut v), Some(true));
        assert_eq!(read_bool(&qs, "b", &mut v), Some(false));
        assert_eq!(read_bool(&qs, "c", &mut v), Some(true));
        assert_eq!(read_bool(&qs, "missing", &mut v), None);
        assert!(v.valid());

        assert_eq!(read_bool(&qs, "d", &mut v), None);
        assert_eq!(v.errors()["d"], "must be a boolean value");
    }
}

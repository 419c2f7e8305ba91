//! Catalog record helpers
//!
//! Catalog responses are kept as untyped JSON objects: no schema is
//! enforced and any key may be missing.

use serde_json::{Map, Value};

/// One object returned by a catalog listing or detail endpoint
pub type CatalogRecord = Map<String, Value>;

/// Fields dropped from every published-data document before output
pub const EXCLUDED_DOCUMENT_FIELDS: &[&str] = &["thumbnail", "history"];

/// Remove `fields` from `record` in place, keeping the order of the
/// remaining keys. Returns how many were present.
pub fn strip_fields(record: &mut CatalogRecord, fields: &[&str]) -> usize {
    fields
        .iter()
        .filter(|field| record.shift_remove(**field).is_some())
        .count()
}

/// Copy of `record` without `fields`
/// String value of `key`, if present and a string
pub fn str_field<'a>(record: &'a CatalogRecord, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Identifier value of `key` as text: strings as-is, numbers rendered.
pub fn id_field(record: &CatalogRecord, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier elements of the array under `key`, in order.
///
/// Strings are taken as-is and numbers rendered; any other element is
/// skipped with a warning. A missing key or a non-array value yields an
/// empty list.
pub fn id_array(record: &CatalogRecord, key: &str) -> Vec<String> {
    let Some(ids) = record.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    ids.iter()
        .filter_map(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            other => {
                log::warn!("skipping non-identifier {key} element {other}");
                None
            }
        })
        .collect()
}

//! Backward-compatibility normalization applied before validation.
//!
//! Older content files used `location` instead of `address` and often
//! omitted `id`. Both are filled in here so the validator only ever sees
//! the current schema.

use cafeco_cafe_models::{CafeField, LEGACY_LOCATION_FIELD};
use serde_json::Value;

use crate::RawRecord;

/// Maps legacy fields onto the current schema in place.
///
/// - `address` absent, null, or empty and `location` is a string: copy
///   `location` into `address`.
/// - `id` absent, null, or empty and `slug` is a string: copy `slug` into
///   `id`.
///
/// Values of the wrong type are left alone for the validator to report.
pub fn normalize_legacy_fields(record: &mut RawRecord) {
    if is_unset(record.get(CafeField::Address.as_ref()))
        && let Some(location) = record.get(LEGACY_LOCATION_FIELD).and_then(Value::as_str)
    {
        let location = location.to_string();
        record.insert(CafeField::Address.to_string(), Value::String(location));
    }

    if is_unset(record.get(CafeField::Id.as_ref()))
        && let Some(slug) = record.get(CafeField::Slug.as_ref()).and_then(Value::as_str)
    {
        let slug = slug.to_string();
        record.insert(CafeField::Id.to_string(), Value::String(slug));
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

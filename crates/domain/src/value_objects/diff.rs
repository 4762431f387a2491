//! Shallow merge and diff over JSON objects
//!
//! Pile configuration is persisted as a flat flag object. Updates arrive as
//! partial objects that are merged key-by-key, and observers only receive the
//! keys whose values actually changed.

use serde_json::{Map, Value};

/// Overlay `patch` onto `base`. Keys in `patch` replace keys in `base`;
/// nested objects are merged recursively, everything else is replaced.
pub fn merge_object(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in patch_map {
                let next = match merged.get(key) {
                    Some(existing @ Value::Object(_)) if value.is_object() => {
                        merge_object(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, patch) => patch.clone(),
    }
}

/// Keys of `after` whose values differ from `before`.
///
/// Keys that disappear are not reported; the flag object never drops keys.
pub fn shallow_diff(before: &Value, after: &Value) -> Map<String, Value> {
    let empty = Map::new();
    let before = before.as_object().unwrap_or(&empty);
    let Some(after) = after.as_object() else {
        return Map::new();
    };
    after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

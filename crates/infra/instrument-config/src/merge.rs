//! RFC 7396 JSON Merge Patch over configuration layers.
//!
//! Objects merge recursively, `null` removes a key, and anything else in the
//! patch replaces what was there.

use serde_json::{Map, Value};

/// Apply `patch` onto `target` in place.
///
/// ```
/// use serde_json::json;
/// use instrument_config::merge::apply_patch;
///
/// let mut config = json!({"prefix": "Svc", "output": {"force": false}});
/// apply_patch(&mut config, json!({"output": {"package": "metrics"}, "prefix": null}));
/// assert_eq!(config, json!({"output": {"force": false, "package": "metrics"}}));
/// ```
pub fn apply_patch(target: &mut Value, patch: Value) {
    let Value::Object(patch) = patch else {
        *target = patch;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(fields) = target else {
        return;
    };

    for (key, value) in patch {
        if value.is_null() {
            fields.remove(&key);
        } else {
            apply_patch(fields.entry(key).or_insert(Value::Null), value);
        }
    }
}

/// Fold layers from lowest to highest precedence into one document.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        apply_patch(&mut merged, layer);
    }
    merged
}

//! Deep merge over JSON trees
//!
//! One rule: when both sides hold an object, their fields merge
//! recursively. Anything else on the override side (arrays, strings,
//! numbers, booleans, null) replaces the base value wholesale.

use serde_json::{Map, Value};

/// Merge `overrides` onto `base`, returning the combined tree.
///
/// Neither input is modified.
pub fn deep_merge(base: &Value, overrides: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overrides);
    merged
}

/// In-place variant of [`deep_merge`]: folds `overrides` into `target`.
pub fn merge_into(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => merge_maps(target, overrides),
        (target, overrides) => *target = overrides.clone(),
    }
}

fn merge_maps(target: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match target.get_mut(key) {
            Some(existing) => merge_into(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Truthiness of a config value, the way a skip decision reads it.
///
/// `null`, `false`, `0` and `""` are falsy. Objects and arrays are truthy
/// even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

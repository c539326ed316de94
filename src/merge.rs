//! Shallow merge used by merge updates.

#[cfg(test)]
#[path = "merge_test.rs"]
mod merge_test;

use serde_json::Value;

/// Overlay `candidate`'s top-level fields onto `current`.
///
/// Only one level deep: a nested object in `candidate` replaces the nested
/// object in `current` wholesale. If either side is not a JSON object the
/// candidate wins outright.
#[must_use]
pub fn shallow_merge(current: Value, candidate: Value) -> Value {
    match (current, candidate) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (field, value) in patch {
                base.insert(field, value);
            }
            Value::Object(base)
        }
        (_, candidate) => candidate,
    }
}

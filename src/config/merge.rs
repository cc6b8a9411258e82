//! Deep merge of configuration tiers.
//!
//! Objects merge key by key, with the higher tier winning. Anything else
//! (scalars, arrays) is replaced wholesale. A null in a higher tier means
//! "not specified" and leaves the lower value in place.

use serde_json::Value;

/// Merge `overlay` on top of `base`.
///
/// ```
/// use serde_json::json;
/// use taskflow::config::deep_merge;
///
/// let merged = deep_merge(
///     json!({"server": {"port": 5000, "host": "127.0.0.1"}}),
///     json!({"server": {"port": 8080}}),
/// );
/// assert_eq!(merged, json!({"server": {"port": 8080, "host": "127.0.0.1"}}));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(upper)) => {
            for (key, upper_value) in upper {
                let value = match merged.remove(&key) {
                    Some(lower_value) => deep_merge(lower_value, upper_value),
                    None => upper_value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in priority order (lowest first).
pub fn deep_merge_all(tiers: impl IntoIterator<Item = Value>) -> Value {
    tiers.into_iter().fold(Value::Null, deep_merge)
}

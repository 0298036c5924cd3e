//! Field-by-field merging of configuration tiers.
//!
//! Higher tiers override lower ones key by key. Arrays are replaced whole.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
///
/// Objects merge key by key. A null overlay means "not specified" and leaves
/// the base untouched, including for keys the base does not have yet. Any
/// other overlay value replaces the base value.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(entries)) => {
            for (key, value) in entries {
                match target.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None if value.is_null() => {}
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Owned form of [`merge_into`].
///
/// # Example
/// ```
/// use serde_json::json;
/// use gantt_tree::config::deep_merge;
///
/// let base = json!({"colors": {"default_entity": "#2975B2", "task_background": "#bae637"}});
/// let overlay = json!({"colors": {"default_entity": "#336699"}});
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged["colors"]["default_entity"], "#336699");
/// assert_eq!(merged["colors"]["task_background"], "#bae637");
/// ```
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Merge tiers in order, lowest priority first.
pub fn deep_merge_all(tiers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for tier in tiers {
        merge_into(&mut merged, tier);
    }
    merged
}

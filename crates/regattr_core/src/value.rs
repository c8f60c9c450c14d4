//! Attribute value helpers.
//!
//! # Responsibility
//! - Fix the dynamic value representation shared by defaults, accessors and
//!   form options.
//! - Provide blank detection, multi-value compaction and deep merge.
//!
//! # Invariants
//! - Helpers never mutate their inputs in place; callers receive new values.

use serde_json::Map;

/// Dynamic attribute value.
pub type Value = serde_json::Value;

/// JSON object used for form options and accession options.
pub type OptionMap = Map<String, Value>;

/// Returns whether a value counts as blank.
///
/// `null`, `false`, whitespace-only strings, and empty arrays/objects are
/// blank. Numbers are never blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(_) => false,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}

/// Returns whether a value is present (not blank).
pub fn is_present(value: &Value) -> bool {
    !is_blank(value)
}

/// Flattens nested arrays into one level and drops blank entries.
///
/// A scalar input becomes a one-element list; `null` becomes an empty list.
pub fn compact_values(value: Value) -> Value {
    let mut flat = Vec::new();
    flatten_into(value, &mut flat);
    Value::Array(flat.into_iter().filter(is_present).collect())
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Null => {}
        other => out.push(other),
    }
}

/// Recursively merges `overrides` into `base`.
///
/// Nested objects merge key by key; every other leaf in `overrides` wins.
pub fn deep_merge(mut base: OptionMap, overrides: &OptionMap) -> OptionMap {
    for (key, incoming) in overrides {
        let merged = match (base.remove(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                Value::Object(deep_merge(existing, nested))
            }
            (_, other) => other.clone(),
        };
        base.insert(key.clone(), merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::{compact_values, deep_merge, is_blank, OptionMap};
    use serde_json::json;

    fn object(value: serde_json::Value) -> OptionMap {
        value.as_object().cloned().expect("fixture should be an object")
    }

    #[test]
    fn blank_follows_presence_rules() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!(false)));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(true)));
        assert!(!is_blank(&json!("a")));
    }

    #[test]
    fn compact_flattens_and_drops_blanks() {
        let compacted = compact_values(json!(["a", "", ["b", null, ["c"]], "  "]));
        assert_eq!(compacted, json!(["a", "b", "c"]));
    }

    #[test]
    fn compact_wraps_scalars_and_empties_null() {
        assert_eq!(compact_values(json!("solo")), json!(["solo"]));
        assert_eq!(compact_values(json!(null)), json!([]));
    }

    #[test]
    fn deep_merge_prefers_override_leaves() {
        let base = object(json!({"input_html": {"style": "picker", "size": 5}, "hint": "a"}));
        let overrides = object(json!({"input_html": {"size": 10}, "label": "b"}));

        let merged = deep_merge(base, &overrides);
        assert_eq!(
            serde_json::Value::Object(merged),
            json!({"input_html": {"style": "picker", "size": 10}, "hint": "a", "label": "b"})
        );
    }

    #[test]
    fn deep_merge_replaces_non_object_with_object() {
        let base = object(json!({"input_html": "raw"}));
        let overrides = object(json!({"input_html": {"size": 10}}));

        let merged = deep_merge(base, &overrides);
        assert_eq!(merged["input_html"], json!({"size": 10}));
    }
}

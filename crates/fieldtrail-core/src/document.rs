//! Document snapshot helpers.
//!
//! Snapshots are plain `serde_json::Value` trees supplied by the host. Any
//! live-handle unwrapping happens before a value reaches this crate, so the
//! engine only ever inspects plain data.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A plain structured snapshot of a record.
pub type Document = Value;

/// Width of a foreign-key identifier in hexadecimal characters.
pub const OBJECT_ID_LEN: usize = 24;

/// Key marking an extended-JSON date object (`{"$date": ...}`).
pub const DATE_KEY: &str = "$date";

/// Shape of a value, resolved by inspection at each recursion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueShape<'a> {
    /// Null, bool, number or plain string
    Scalar(&'a Value),
    /// Extended-JSON date; compared by exact equality like any scalar
    Date(&'a Value),
    /// String that is syntactically a record identifier
    Reference(&'a str),
    /// Nested object (non-array, non-date)
    Structured(&'a Map<String, Value>),
    /// Ordered collection of objects or primitives
    Array(&'a [Value]),
}

impl<'a> ValueShape<'a> {
    /// Classify a value.
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => ValueShape::Array(items),
            Value::Object(map) if is_date_object(map) => ValueShape::Date(value),
            Value::Object(map) => ValueShape::Structured(map),
            Value::String(s) if is_object_id(s) => ValueShape::Reference(s),
            _ => ValueShape::Scalar(value),
        }
    }
}

fn is_date_object(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.contains_key(DATE_KEY)
}

/// Check whether `s` is a fixed-width hexadecimal record identifier.
pub fn is_object_id(s: &str) -> bool {
    s.len() == OBJECT_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Return the identifier held by `value`, if it is one.
pub fn as_object_id(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| is_object_id(s))
}

/// Look up a dotted path (`orders.0.items.1.price`) in a document.
///
/// Numeric segments index into arrays; any other segment on an array, or any
/// segment on a scalar, yields `None`.
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(doc);
    }
    path.split('.').try_fold(doc, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Same as [`get_path`] but yields `Value::Null` for missing paths.
pub fn value_at(doc: &Value, path: &str) -> Value {
    get_path(doc, path).cloned().unwrap_or(Value::Null)
}

/// Set a dotted path in a document, creating intermediate objects as needed.
///
/// Array segments that point past the end pad the array with nulls.
pub fn set_path(doc: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = doc;
    for segment in parents {
        current = child_slot(current, segment);
    }
    *child_slot(current, last) = value;
}

fn child_slot<'a>(current: &'a mut Value, segment: &str) -> &'a mut Value {
    match (current, segment.parse::<usize>()) {
        (Value::Array(items), Ok(index)) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (current, _) => {
            // Scalars and arrays addressed by name are replaced by an object.
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            &mut current[segment]
        }
    }
}

/// Append a segment to a dotted path.
pub fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}.{segment}")
    }
}

/// First segment of a dotted path.
pub fn root_segment(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// An update document split into literal replacements and skipped directives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedUpdate {
    /// Path/value pairs that represent literal replacement values
    pub assignments: Vec<(String, Value)>,
    /// Operator keys that cannot be diffed as replacements (`$inc`, `$push`, ...)
    pub skipped_directives: Vec<String>,
}

impl FlattenedUpdate {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Split an update document into literal assignments.
///
/// `$set` payloads are unwrapped into their path/value pairs, every other
/// `$`-prefixed directive is skipped, and plain keys are kept as-is.
pub fn flatten_update(update: &Value) -> FlattenedUpdate {
    let mut out = FlattenedUpdate::default();
    let Some(map) = update.as_object() else {
        return out;
    };
    for (key, value) in map {
        if key == "$set" {
            if let Some(set) = value.as_object() {
                out.assignments
                    .extend(set.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        } else if key.starts_with('$') {
            out.skipped_directives.push(key.clone());
        } else {
            out.assignments.push((key.clone(), value.clone()));
        }
    }
    out
}

/// Top-level keys whose values differ between two snapshots, in key order.
pub fn modified_top_level_paths(before: &Value, after: &Value) -> Vec<String> {
    let empty = Map::new();
    let before = before.as_object().unwrap_or(&empty);
    let after = after.as_object().unwrap_or(&empty);
    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    keys.into_iter()
        .filter(|k| before.get(k.as_str()) != after.get(k.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "64b7f0c2a1e4b5d6c7f8a9b0";

    #[test]
    fn test_object_id_syntax() {
        assert!(is_object_id(ID));
        assert!(is_object_id(&ID.to_uppercase()));
        assert!(!is_object_id("64b7f0c2a1e4b5d6c7f8a9b")); // 23 chars
        assert!(!is_object_id("zzb7f0c2a1e4b5d6c7f8a9b0"));
        assert!(!is_object_id("Supplier One"));
    }

    #[test]
    fn test_classify_shapes() {
        let date = json!({"$date": "2026-01-01T00:00:00Z"});
        assert!(matches!(ValueShape::of(&date), ValueShape::Date(_)));
        assert!(matches!(
            ValueShape::of(&json!({"a": 1})),
            ValueShape::Structured(_)
        ));
        assert!(matches!(ValueShape::of(&json!([1, 2])), ValueShape::Array(_)));
        assert!(matches!(ValueShape::of(&json!(ID)), ValueShape::Reference(_)));
        assert!(matches!(ValueShape::of(&json!("x")), ValueShape::Scalar(_)));
        assert!(matches!(ValueShape::of(&Value::Null), ValueShape::Scalar(_)));
    }

    #[test]
    fn test_get_path_through_arrays() {
        let doc = json!({"orders": [{"items": [{"price": 1}, {"price": 2}]}]});
        assert_eq!(get_path(&doc, "orders.0.items.1.price"), Some(&json!(2)));
        assert_eq!(get_path(&doc, "orders.1.items"), None);
        assert_eq!(get_path(&doc, "orders.x"), None);
        assert_eq!(value_at(&doc, "missing.path"), Value::Null);
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut doc = json!({});
        set_path(&mut doc, "address.city", json!("Lyon"));
        set_path(&mut doc, "tags.2", json!("c"));
        assert_eq!(doc["address"]["city"], json!("Lyon"));
        assert_eq!(doc["tags"], json!({"2": "c"}));

        let mut doc = json!({"items": ["a"]});
        set_path(&mut doc, "items.2", json!("c"));
        assert_eq!(doc["items"], json!(["a", null, "c"]));
    }

    #[test]
    fn test_flatten_update_unwraps_set_and_skips_operators() {
        let update = json!({
            "name": "new",
            "$set": {"address.city": "Paris"},
            "$inc": {"count": 1}
        });
        let flat = flatten_update(&update);
        assert_eq!(flat.skipped_directives, vec!["$inc".to_string()]);
        assert!(flat
            .assignments
            .contains(&("address.city".to_string(), json!("Paris"))));
        assert!(flat.assignments.contains(&("name".to_string(), json!("new"))));
        assert_eq!(flat.assignments.len(), 2);
    }

    #[test]
    fn test_flatten_non_object_is_empty() {
        assert!(flatten_update(&Value::Null).is_empty());
        assert!(flatten_update(&json!({"$inc": {"n": 1}})).is_empty());
    }

    #[test]
    fn test_modified_top_level_paths() {
        let before = json!({"a": 1, "b": 2, "c": 3});
        let after = json!({"a": 1, "b": 5, "d": 4});
        assert_eq!(modified_top_level_paths(&before, &after), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_join_and_root() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a.0", "b"), "a.0.b");
        assert_eq!(root_segment("items.0.name"), "items");
    }
}

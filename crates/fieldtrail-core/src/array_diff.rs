//! Set-difference of two arrays.
//!
//! Elements are matched by identity when both sides carry one, by deep
//! equality otherwise. Position is ignored: reordering equal elements yields
//! an empty delta.

use serde_json::Value;

/// Strategy that extracts an element's identity, if it has one.
pub trait ElementIdentity: Send + Sync {
    fn identity<'a>(&self, element: &'a Value) -> Option<&'a Value>;
}

/// Identity read from a named field of object elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdField(pub String);

impl Default for IdField {
    fn default() -> Self {
        Self("_id".to_string())
    }
}

impl ElementIdentity for IdField {
    fn identity<'a>(&self, element: &'a Value) -> Option<&'a Value> {
        element.get(&self.0).filter(|id| !id.is_null())
    }
}

/// No element has an identity; every comparison is structural.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl ElementIdentity for NoIdentity {
    fn identity<'a>(&self, _element: &'a Value) -> Option<&'a Value> {
        None
    }
}

/// An element together with its index in the array it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedElement {
    pub index: usize,
    pub value: Value,
}

/// Result of [`diff_arrays`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayDelta {
    /// Elements of the new array with no counterpart in the old one, in new-array order
    pub added: Vec<IndexedElement>,
    /// Elements of the old array with no counterpart in the new one, in old-array order
    pub removed: Vec<IndexedElement>,
}

impl ArrayDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Identity-aware element equality.
pub fn elements_equal(a: &Value, b: &Value, identity: &dyn ElementIdentity) -> bool {
    match (identity.identity(a), identity.identity(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Compute added and removed elements between `old` and `new`.
pub fn diff_arrays(old: &[Value], new: &[Value], identity: &dyn ElementIdentity) -> ArrayDelta {
    let missing_from = |haystack: &[Value], needle: &Value| {
        !haystack
            .iter()
            .any(|candidate| elements_equal(candidate, needle, identity))
    };

    let added = new
        .iter()
        .enumerate()
        .filter(|(_, element)| missing_from(old, element))
        .map(|(index, value)| IndexedElement {
            index,
            value: value.clone(),
        })
        .collect();
    let removed = old
        .iter()
        .enumerate()
        .filter(|(_, element)| missing_from(new, element))
        .map(|(index, value)| IndexedElement {
            index,
            value: value.clone(),
        })
        .collect();

    ArrayDelta { added, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(delta: &[IndexedElement]) -> Vec<Value> {
        delta.iter().map(|e| e.value.clone()).collect()
    }

    #[test]
    fn test_primitive_set_difference() {
        let delta = diff_arrays(
            &[json!(1), json!(2), json!(3)],
            &[json!(2), json!(3), json!(4)],
            &IdField::default(),
        );
        assert_eq!(values(&delta.added), vec![json!(4)]);
        assert_eq!(values(&delta.removed), vec![json!(1)]);
        assert_eq!(delta.removed[0].index, 0);
        assert_eq!(delta.added[0].index, 2);
    }

    #[test]
    fn test_reorder_is_not_a_change() {
        let delta = diff_arrays(
            &[json!("a"), json!("b")],
            &[json!("b"), json!("a")],
            &NoIdentity,
        );
        assert!(delta.is_empty());
    }

    #[test]
    fn test_identity_wins_over_content() {
        let old = [json!({"_id": "1", "qty": 1})];
        let new = [json!({"_id": "1", "qty": 5})];
        assert!(diff_arrays(&old, &new, &IdField::default()).is_empty());
        let delta = diff_arrays(&old, &new, &NoIdentity);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
    }

    #[test]
    fn test_custom_identity_field() {
        let old = [json!({"sku": "A", "qty": 1}), json!({"sku": "B"})];
        let new = [json!({"sku": "A", "qty": 2})];
        let delta = diff_arrays(&old, &new, &IdField("sku".to_string()));
        assert!(delta.added.is_empty());
        assert_eq!(values(&delta.removed), vec![json!({"sku": "B"})]);
    }

    #[test]
    fn test_one_sided_identity_falls_back_to_deep_equality() {
        let old = [json!({"_id": "1", "n": 1})];
        let new = [json!({"n": 1})];
        let delta = diff_arrays(&old, &new, &IdField::default());
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
    }

    #[test]
    fn test_empty_sides() {
        let delta = diff_arrays(&[], &[json!(1)], &NoIdentity);
        assert_eq!(values(&delta.added), vec![json!(1)]);
        let delta = diff_arrays(&[json!(1)], &[], &NoIdentity);
        assert_eq!(values(&delta.removed), vec![json!(1)]);
    }
}

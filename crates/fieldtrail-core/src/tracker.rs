//! Recursive change tracking.
//!
//! [`ChangeTracker::track`] compares the value at a path of the prior
//! snapshot with a new value and appends field-level changes to a
//! [`ChangeRecord`]. Dispatch is by the shape of the new value:
//!
//! - declared references are compared by resolved display label
//! - objects with `_display` collapse to one change when the label moves,
//!   objects without recurse field by field with a space-joined label
//! - arrays go through the array differ; removals win over additions
//! - scalars and dates are compared by exact equality
//!
//! Sibling paths are tracked one after another so the removal stub rule
//! (an unchanged scalar in a removal record is recorded as `value -> null`)
//! sees the action set by earlier branches.

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::array_diff::{diff_arrays, ElementIdentity};
use crate::config::TrackerConfig;
use crate::document::{join_path, value_at, ValueShape};
use crate::history::ChangeRecord;
use crate::reference::{ReferenceResolver, SchemaMetadata};

/// Diff engine bound to one collection's schema for one operation.
pub struct ChangeTracker<'a> {
    resolver: &'a ReferenceResolver,
    schema: &'a dyn SchemaMetadata,
    identity: &'a dyn ElementIdentity,
    config: &'a TrackerConfig,
}

impl<'a> ChangeTracker<'a> {
    pub fn new(
        resolver: &'a ReferenceResolver,
        schema: &'a dyn SchemaMetadata,
        identity: &'a dyn ElementIdentity,
        config: &'a TrackerConfig,
    ) -> Self {
        Self {
            resolver,
            schema,
            identity,
            config,
        }
    }

    /// Compare `after` with the value at `path` in `before_doc`.
    ///
    /// Changes are appended to `record` under `label`; array branches may
    /// also set its action.
    pub fn track<'s>(
        &'s self,
        before_doc: &'s Value,
        path: &'s str,
        after: &'s Value,
        record: &'s mut ChangeRecord,
        label: &'s str,
    ) -> BoxFuture<'s, ()> {
        Box::pin(async move {
            let before = value_at(before_doc, path);

            if before != *after
                && self
                    .resolver
                    .is_reference_field(self.schema, path, &before, after)
            {
                self.track_reference(path, before, after, record, label)
                    .await;
                return;
            }

            match ValueShape::of(after) {
                ValueShape::Structured(fields) => {
                    self.track_structured(before_doc, path, &before, fields, record, label)
                        .await
                }
                ValueShape::Array(items) => {
                    self.track_array(path, &before, items, record, label)
                        .await
                }
                ValueShape::Scalar(_) | ValueShape::Date(_) | ValueShape::Reference(_) => {
                    track_scalar(before, after, record, label)
                }
            }
        })
    }

    /// Record a reference change as resolved labels, falling back to the raw
    /// identifiers when both sides resolve to the same label.
    async fn track_reference(
        &self,
        path: &str,
        before: Value,
        after: &Value,
        record: &mut ChangeRecord,
        label: &str,
    ) {
        let old = self.resolve_or_null(path, &before).await;
        let new = self.resolve_or_null(path, after).await;
        if old == new {
            record.push(label, before, after.clone());
        } else {
            record.push(label, old, new);
        }
    }

    async fn resolve_or_null(&self, path: &str, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        self.resolver
            .resolve_value_label(self.schema, path, value)
            .await
    }

    async fn track_structured(
        &self,
        before_doc: &Value,
        path: &str,
        before: &Value,
        fields: &Map<String, Value>,
        record: &mut ChangeRecord,
        label: &str,
    ) {
        let display_field = self.resolver.display_field();
        if let Some(after_display) = fields.get(display_field) {
            let display_path = join_path(path, display_field);
            let before_display = before.get(display_field).cloned().unwrap_or(Value::Null);
            let old = self.resolve_or_null(&display_path, &before_display).await;
            let new = self.resolve_or_null(&display_path, after_display).await;
            if old != new {
                record.push(label, old, new);
                return;
            }
        }

        for (key, value) in fields {
            if self.config.is_ignored_key(key) {
                continue;
            }
            let child_path = join_path(path, key);
            if self.config.is_excluded(&child_path) {
                continue;
            }
            let child_label = format!("{} {}", label, key);
            self.track(before_doc, &child_path, value, record, &child_label)
                .await;
        }
    }

    async fn track_array(
        &self,
        path: &str,
        before: &Value,
        items: &[Value],
        record: &mut ChangeRecord,
        label: &str,
    ) {
        let old_items = before.as_array().map(Vec::as_slice).unwrap_or(&[]);
        let delta = diff_arrays(old_items, items, self.identity);

        if !delta.removed.is_empty() {
            record.mark_removed();
            for element in &delta.removed {
                let shown = self.element_display(path, element.index, &element.value).await;
                record.push(label, shown, Value::Null);
            }
        } else if !delta.added.is_empty() {
            record.mark_added();
            for element in &delta.added {
                let shown = self.element_display(path, element.index, &element.value).await;
                record.push(label, Value::Null, shown);
            }
        }
    }

    async fn element_display(&self, path: &str, index: usize, element: &Value) -> Value {
        let element_path = join_path(path, &index.to_string());
        self.resolver
            .resolve_display(self.schema, &element_path, element)
            .await
    }
}

fn track_scalar(before: Value, after: &Value, record: &mut ChangeRecord, label: &str) {
    if before != *after {
        record.push(label, before, after.clone());
    } else if record.is_removal() && !before.is_null() {
        record.push(label, before, Value::Null);
    }
}

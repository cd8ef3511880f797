//! Reference resolution.
//!
//! A field holding a record identifier can point at a record in another
//! collection. The resolver swaps such identifiers for the referenced
//! record's display label, following `_display` chains that are themselves
//! references. Misses are logged and fall back to the raw value; they never
//! abort a diff.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{as_object_id, join_path};
use crate::errors::Result;
use crate::logger::TrackLogger;
use crate::pattern::FieldPattern;
use crate::store::RecordStore;

/// Upper bound on `_display` hops followed for a single value.
pub const MAX_DISPLAY_DEPTH: usize = 8;

/// Static schema knowledge about which fields reference other collections.
pub trait SchemaMetadata: Send + Sync {
    /// Collection referenced by the field at `field_path`, if any.
    ///
    /// `field_path` is concrete (array indices included).
    fn reference_target(&self, field_path: &str) -> Option<&str>;
}

/// Field-pattern keyed reference declarations.
///
/// `items.$.supplier -> suppliers` declares that every array element's
/// `supplier` field references the `suppliers` collection.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    entries: Vec<(FieldPattern, String)>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a reference, builder style.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if `pattern` does not compile.
    pub fn with_reference(mut self, pattern: &str, collection: impl Into<String>) -> Result<Self> {
        self.add(pattern, collection)?;
        Ok(self)
    }

    /// Declare a reference.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if `pattern` does not compile.
    pub fn add(&mut self, pattern: &str, collection: impl Into<String>) -> Result<()> {
        self.entries
            .push((FieldPattern::compile(pattern)?, collection.into()));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SchemaMetadata for ReferenceMap {
    fn reference_target(&self, field_path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches(field_path))
            .map(|(_, collection)| collection.as_str())
    }
}

/// A collection's store paired with its schema metadata.
#[derive(Clone)]
pub struct Model {
    pub store: Arc<dyn RecordStore>,
    pub schema: Arc<dyn SchemaMetadata>,
}

impl Model {
    pub fn new(store: Arc<dyn RecordStore>, schema: Arc<dyn SchemaMetadata>) -> Self {
        Self { store, schema }
    }

    /// A model whose fields reference nothing.
    pub fn without_references(store: Arc<dyn RecordStore>) -> Self {
        Self::new(store, Arc::new(ReferenceMap::new()))
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model").finish_non_exhaustive()
    }
}

/// Lookup from collection name to model.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection, builder style.
    pub fn with_model(mut self, collection: impl Into<String>, model: Model) -> Self {
        self.register(collection, model);
        self
    }

    pub fn register(&mut self, collection: impl Into<String>, model: Model) {
        self.models.insert(collection.into(), model);
    }

    pub fn model_for(&self, collection: &str) -> Option<&Model> {
        self.models.get(collection)
    }
}

/// Turns reference identifiers and `_display` fields into labels.
pub struct ReferenceResolver {
    registry: ModelRegistry,
    display_field: String,
    logger: Arc<dyn TrackLogger>,
}

impl ReferenceResolver {
    pub fn new(
        registry: ModelRegistry,
        display_field: impl Into<String>,
        logger: Arc<dyn TrackLogger>,
    ) -> Self {
        Self {
            registry,
            display_field: display_field.into(),
            logger,
        }
    }

    pub fn display_field(&self) -> &str {
        &self.display_field
    }

    /// True if the field is a declared reference and either side holds an identifier.
    pub fn is_reference_field(
        &self,
        schema: &dyn SchemaMetadata,
        field_path: &str,
        before: &Value,
        after: &Value,
    ) -> bool {
        (as_object_id(before).is_some() || as_object_id(after).is_some())
            && schema.reference_target(field_path).is_some()
    }

    /// Resolve `value` to a display label, or return it unchanged.
    ///
    /// Non-identifiers and fields without a declared reference come back as
    /// they are. For a reference, the target record's `_display` is resolved
    /// in turn; the chain ends at the first non-identifier. A dangling
    /// reference, a fetch failure or a record without `_display` yields the
    /// last identifier reached.
    pub async fn resolve_value_label(
        &self,
        schema: &dyn SchemaMetadata,
        field_path: &str,
        value: &Value,
    ) -> Value {
        let mut current = value.clone();
        let mut path = field_path.to_string();
        let mut hop_schema: Option<Arc<dyn SchemaMetadata>> = None;

        for _ in 0..MAX_DISPLAY_DEPTH {
            let Some(id) = as_object_id(&current).map(str::to_string) else {
                return current;
            };
            let target = match &hop_schema {
                Some(s) => s.reference_target(&path).map(str::to_string),
                None => schema.reference_target(&path).map(str::to_string),
            };
            let Some(target) = target else {
                return current;
            };
            let Some(model) = self.registry.model_for(&target) else {
                self.logger.warn(
                    "resolve_value_label",
                    &format!(
                        "no model registered for collection '{}' referenced by '{}'",
                        target, path
                    ),
                );
                return current;
            };

            match model.store.find_by_id(&id).await {
                Ok(Some(doc)) => match doc.get(&self.display_field) {
                    Some(display) if !display.is_null() => {
                        current = display.clone();
                        path = self.display_field.clone();
                        hop_schema = Some(model.schema.clone());
                    }
                    _ => return current,
                },
                Ok(None) => {
                    self.logger.warn(
                        "resolve_value_label",
                        &format!(
                            "dangling reference: {} '{}' not found for '{}'",
                            target, id, path
                        ),
                    );
                    return current;
                }
                Err(err) => {
                    self.logger.warn(
                        "resolve_value_label",
                        &format!("failed to fetch {} '{}': {}", target, id, err),
                    );
                    return current;
                }
            }
        }

        self.logger.warn(
            "resolve_value_label",
            &format!(
                "display chain for '{}' exceeds {} hops",
                field_path, MAX_DISPLAY_DEPTH
            ),
        );
        current
    }

    /// Human-readable label for the value held at `field_path`.
    ///
    /// Uses the value's resolved `_display` when it has one; falls back to
    /// `field_path` itself.
    pub async fn resolve_field_label(
        &self,
        schema: &dyn SchemaMetadata,
        field_path: &str,
        value: &Value,
    ) -> String {
        let Some(display) = value.get(&self.display_field) else {
            return field_path.to_string();
        };
        let display_path = join_path(field_path, &self.display_field);
        let resolved = self
            .resolve_value_label(schema, &display_path, display)
            .await;
        label_text(&resolved).unwrap_or_else(|| field_path.to_string())
    }

    /// Resolved display of a value that may carry `_display`, else the value itself.
    ///
    /// Used for array elements and structured values: an object with a
    /// display field is represented by its resolved label, a reference by
    /// its referenced record's label, anything else as-is.
    pub async fn resolve_display(
        &self,
        schema: &dyn SchemaMetadata,
        field_path: &str,
        value: &Value,
    ) -> Value {
        match value.get(&self.display_field) {
            Some(display) if value.is_object() => {
                let display_path = join_path(field_path, &self.display_field);
                self.resolve_value_label(schema, &display_path, display)
                    .await
            }
            _ => self.resolve_value_label(schema, field_path, value).await,
        }
    }
}

/// Render a scalar label as text.
pub fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

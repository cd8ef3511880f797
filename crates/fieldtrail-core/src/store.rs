use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::{get_path, set_path, Document};
use crate::errors::{ExError, ExErrorKind, ExResult};

/// Equality filter over dotted paths: every entry must match.
pub type Filter = Map<String, Value>;

/// Options for [`RecordStore::update_one`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Tell the host's hook not to run history tracking for this write
    pub bypass_tracking: bool,
}

impl UpdateOptions {
    pub fn bypassing_tracking() -> Self {
        Self {
            bypass_tracking: true,
        }
    }
}

/// Persistence collaborator for one collection.
///
/// The tracker only reads snapshots and writes its ledger back; how the
/// host stores documents is its own business.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record by identity.
    async fn find_by_id(&self, id: &str) -> ExResult<Option<Document>>;

    /// Fetch the first record matching `filter`.
    async fn find_one(&self, filter: &Filter) -> ExResult<Option<Document>>;

    /// Apply `patch` (dotted path -> value) to the first record matching `filter`.
    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Document,
        options: UpdateOptions,
    ) -> ExResult<()>;
}

/// Build a filter selecting one record by identity.
pub fn filter_by_id(id_field: &str, id: &str) -> Filter {
    let mut filter = Filter::new();
    filter.insert(id_field.to_string(), Value::String(id.to_string()));
    filter
}

/// True if every filter entry equals the value at its path in `doc`.
pub fn matches_filter(doc: &Value, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(path, expected)| get_path(doc, path) == Some(expected))
}

/// Apply a dotted-path patch to a document in place.
pub fn apply_patch(doc: &mut Value, patch: &Document) {
    if let Some(entries) = patch.as_object() {
        for (path, value) in entries {
            set_path(doc, path, value.clone());
        }
    }
}

/// One call made to [`MemoryStore::update_one`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub filter: Filter,
    pub patch: Document,
    pub options: UpdateOptions,
}

/// In-memory record store
///
/// A `Vec`-backed collection keyed by `id_field`, mainly for tests and the
/// CLI. Every `update_one` call is remembered so tests can assert on the
/// follow-up ledger write.
#[derive(Debug)]
pub struct MemoryStore {
    id_field: String,
    docs: RwLock<Vec<Document>>,
    updates: Mutex<Vec<UpdateCall>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store keyed by `_id`
    pub fn new() -> Self {
        Self::with_id_field("_id")
    }

    /// Create an empty store keyed by a custom identity field
    pub fn with_id_field(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            docs: RwLock::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Insert or replace a document (matched by identity field)
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the document has no string identity, or
    /// `Internal` if the store lock is poisoned.
    pub fn insert(&self, doc: Document) -> ExResult<()> {
        let id = doc
            .get(&self.id_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("memory_store_insert")
                    .with_message(format!("document has no string `{}`", self.id_field))
            })?
            .to_string();
        let mut docs = self.docs.write().map_err(|_| poisoned("memory_store_insert"))?;
        match docs
            .iter_mut()
            .find(|d| d.get(&self.id_field).and_then(Value::as_str) == Some(id.as_str()))
        {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
        Ok(())
    }

    /// Get a copy of a document by identity
    pub fn get(&self, id: &str) -> Option<Document> {
        self.docs.read().ok().and_then(|docs| {
            docs.iter()
                .find(|d| d.get(&self.id_field).and_then(Value::as_str) == Some(id))
                .cloned()
        })
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every `update_one` call received so far, oldest first
    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

fn poisoned(op: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_message("memory store lock poisoned")
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> ExResult<Option<Document>> {
        Ok(self.get(id))
    }

    async fn find_one(&self, filter: &Filter) -> ExResult<Option<Document>> {
        let docs = self.docs.read().map_err(|_| poisoned("memory_store_find_one"))?;
        Ok(docs.iter().find(|d| matches_filter(d, filter)).cloned())
    }

    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Document,
        options: UpdateOptions,
    ) -> ExResult<()> {
        {
            let mut docs = self
                .docs
                .write()
                .map_err(|_| poisoned("memory_store_update_one"))?;
            if let Some(doc) = docs.iter_mut().find(|d| matches_filter(d, filter)) {
                apply_patch(doc, patch);
            }
        }
        self.updates
            .lock()
            .map_err(|_| poisoned("memory_store_update_one"))?
            .push(UpdateCall {
                filter: filter.clone(),
                patch: patch.clone(),
                options,
            });
        Ok(())
    }
}

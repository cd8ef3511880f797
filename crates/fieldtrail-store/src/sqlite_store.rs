//! SQLite-backed record store
//!
//! One `documents` table holds every collection; a [`SqliteStore`] is a view
//! of a single collection over a shared connection.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use fieldtrail_core::store::{apply_patch, matches_filter, Filter, RecordStore, UpdateOptions};
use fieldtrail_core::{Document, ExResult};
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

use crate::db;
use crate::errors::{corrupt_document, from_rusqlite, missing_identity, poisoned, Result};
use crate::migrations::apply_migrations;

/// Collection-scoped document store persisted in SQLite.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    id_field: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("collection", &self.collection)
            .field("id_field", &self.id_field)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database file and migrate it.
    pub fn open<P: AsRef<Path>>(path: P, collection: impl Into<String>) -> Result<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn, collection))
    }

    /// Migrated in-memory database, mainly for tests.
    pub fn in_memory(collection: impl Into<String>) -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn, collection))
    }

    /// Wrap a connection that has already been migrated.
    pub fn from_connection(conn: Connection, collection: impl Into<String>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.into(),
            id_field: "_id".to_string(),
        }
    }

    /// Another collection over the same connection
    pub fn sibling(&self, collection: impl Into<String>) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            collection: collection.into(),
            id_field: self.id_field.clone(),
        }
    }

    /// Key documents by a custom identity field instead of `_id`
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Insert or replace a document, keyed by its identity field.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the document has no string identity, `Persistence`
    /// if the write fails.
    pub fn insert(&self, doc: &Document) -> Result<()> {
        let id = doc
            .get(&self.id_field)
            .and_then(Value::as_str)
            .ok_or_else(|| missing_identity(&self.id_field))?;
        let body = serde_json::to_string(doc)?;
        let now = chrono::Utc::now().timestamp();
        self.lock("sqlite_insert")?
            .execute(
                "INSERT INTO documents (collection, id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(collection, id) DO UPDATE SET
                    body = excluded.body,
                    updated_at = excluded.updated_at",
                rusqlite::params![self.collection, id, body, now],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Fetch a document by identity
    pub fn get(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.lock("sqlite_get")?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                rusqlite::params![self.collection, id],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;
        body.map(|b| self.decode(id, &b)).transpose()
    }

    /// Every document in the collection, in insertion order
    pub fn all(&self) -> Result<Vec<Document>> {
        let conn = self.lock("sqlite_all")?;
        self.rows(&conn)?
            .into_iter()
            .map(|(id, body)| self.decode(&id, &body))
            .collect()
    }

    /// Number of documents in the collection
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .lock("sqlite_len")?
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                [&self.collection],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self, op: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| poisoned(op))
    }

    fn rows(&self, conn: &Connection) -> Result<Vec<(String, String)>> {
        let mut stmt = conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid")
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([&self.collection], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<(String, String)>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    fn decode(&self, id: &str, body: &str) -> Result<Document> {
        serde_json::from_str(body).map_err(|e| corrupt_document(&self.collection, id, e))
    }

    /// Identity value when the filter is a plain identity lookup
    fn identity_lookup<'f>(&self, filter: &'f Filter) -> Option<&'f str> {
        if filter.len() != 1 {
            return None;
        }
        filter.get(&self.id_field).and_then(Value::as_str)
    }

    fn first_match(&self, conn: &Connection, filter: &Filter) -> Result<Option<(String, Document)>> {
        for (id, body) in self.rows(conn)? {
            let doc = self.decode(&id, &body)?;
            if matches_filter(&doc, filter) {
                return Ok(Some((id, doc)));
            }
        }
        Ok(None)
    }

    fn patch_first(&self, filter: &Filter, patch: &Document) -> Result<bool> {
        let mut conn = self.lock("sqlite_update_one")?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let Some((id, mut doc)) = self.first_match(&tx, filter)? else {
            return Ok(false);
        };
        apply_patch(&mut doc, patch);
        tx.execute(
            "UPDATE documents SET body = ?1, updated_at = ?2 WHERE collection = ?3 AND id = ?4",
            rusqlite::params![
                serde_json::to_string(&doc)?,
                chrono::Utc::now().timestamp(),
                self.collection,
                id
            ],
        )
        .map_err(from_rusqlite)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(true)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn find_by_id(&self, id: &str) -> ExResult<Option<Document>> {
        self.get(id)
    }

    async fn find_one(&self, filter: &Filter) -> ExResult<Option<Document>> {
        if let Some(id) = self.identity_lookup(filter) {
            return self.get(id);
        }
        let conn = self.lock("sqlite_find_one")?;
        Ok(self.first_match(&conn, filter)?.map(|(_, doc)| doc))
    }

    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Document,
        options: UpdateOptions,
    ) -> ExResult<()> {
        let matched = self.patch_first(filter, patch)?;
        tracing::debug!(
            collection = %self.collection,
            matched,
            bypass_tracking = options.bypass_tracking,
            "sqlite update_one"
        );
        Ok(())
    }
}

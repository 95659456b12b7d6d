use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use time::OffsetDateTime;

use crate::models::{LabelCatalog, LabelId};

use super::schema::SCHEMA;
use super::{CatalogSource, LabelSink, StoreError};

/// A label currently applied to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAssignment {
    pub label: LabelId,
    pub title: String,
    pub applied_at: OffsetDateTime,
}

/// SQLite-backed label catalog and assignment store.
pub struct LabelStore {
    conn: Connection,
}

impl LabelStore {
    /// Opens an in-memory store.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Opens a file-based store at `path`, creating the file if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// `{data_dir}/labelsmith/labels.db`, if the platform has a data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("labelsmith").join("labels.db"))
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Adds the catalog's labels, updating titles of labels already present.
    ///
    /// New labels are appended after existing ones, in catalog order.
    /// Returns the number of labels written.
    pub fn import_catalog(&self, catalog: &LabelCatalog) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;

        let mut next: i64 = tx.query_row("SELECT COALESCE(MAX(position) + 1, 0) FROM labels", [], |row| {
            row.get(0)
        })?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO labels (id, title, position) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title",
            )?;
            for (id, title) in catalog.iter() {
                stmt.execute(params![id.as_str(), title, next])?;
                next += 1;
            }
        }

        tx.commit()?;
        tracing::info!(count = catalog.len(), "imported label catalog");
        Ok(catalog.len())
    }

    pub fn contains(&self, id: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM labels WHERE id = ?1", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Labels currently applied to `document`, in the order they were applied.
    pub fn assignments(&self, document: &str) -> Result<Vec<LabelAssignment>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.title, dl.applied_at
             FROM document_labels dl
             JOIN labels l ON l.id = dl.label_id
             WHERE dl.document = ?1
             ORDER BY dl.position",
        )?;

        let rows = stmt.query_map([document], |row| {
            let id: String = row.get(0)?;
            let timestamp: i64 = row.get(2)?;
            let applied_at = OffsetDateTime::from_unix_timestamp(timestamp).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
            })?;

            Ok(LabelAssignment {
                label: LabelId::new(id),
                title: row.get(1)?,
                applied_at,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CatalogSource for LabelStore {
    fn all_available_labels(&self) -> Result<LabelCatalog, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title FROM labels ORDER BY position")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut catalog = LabelCatalog::new();
        for row in rows {
            let (id, title) = row?;
            catalog.insert(id, title);
        }
        Ok(catalog)
    }
}

impl LabelSink for LabelStore {
    /// Replaces the document's labels with the known IDs among `labels`.
    ///
    /// Unknown IDs are dropped with a warning. An empty list, or one with no
    /// known IDs, leaves the document untouched.
    fn apply_labels(&self, document: &str, labels: &[LabelId]) -> Result<usize, StoreError> {
        if labels.is_empty() {
            tracing::warn!(document, "no labels to apply");
            return Ok(0);
        }

        let mut known = Vec::with_capacity(labels.len());
        for label in labels {
            if known.contains(&label) {
                continue;
            }
            if self.contains(label.as_str())? {
                known.push(label);
            } else {
                tracing::warn!(document, label = %label, "label not found in store, skipping");
            }
        }

        if known.is_empty() {
            tracing::warn!(document, "none of the labels could be resolved");
            return Ok(0);
        }

        let applied_at = OffsetDateTime::now_utc().unix_timestamp();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM document_labels WHERE document = ?1", [document])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO document_labels (document, label_id, position, applied_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, label) in known.iter().enumerate() {
                stmt.execute(params![document, label.as_str(), position as i64, applied_at])?;
            }
        }
        tx.commit()?;

        tracing::info!(document, count = known.len(), "applied labels");
        Ok(known.len())
    }
}

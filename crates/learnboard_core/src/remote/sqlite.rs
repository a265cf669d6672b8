//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist hierarchical documents in one `documents` table keyed by
//!   `(collection, doc_id)` with JSON-encoded fields.
//!
//! # Invariants
//! - Field payloads are always JSON objects.
//! - Ordering follows `sort_documents`, identical to the in-memory store.

use super::{
    sort_documents, CollectionPath, Document, DocumentPath, DocumentStore, Fields, OrderBy,
    RemoteError, RemoteResult,
};
use crate::db::{open_db, open_db_in_memory};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Document store persisted in a migrated SQLite database.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RemoteResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> RemoteResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already went through `open_db`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> RemoteResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RemoteError::Backend("sqlite connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_documents(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> RemoteResult<Vec<Document>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT doc_id, fields
             FROM documents
             WHERE collection = ?1;",
        )?;
        let mut rows = stmt.query([collection.as_str()])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get("fields")?;
            documents.push(Document {
                id: row.get("doc_id")?,
                fields: decode_fields(&raw)?,
            });
        }
        sort_documents(&mut documents, order);
        Ok(documents)
    }

    async fn get_document(&self, path: &DocumentPath) -> RemoteResult<Option<Document>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT fields FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![path.parent().as_str(), path.id()],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(Document {
                id: path.id().to_string(),
                fields: decode_fields(&raw)?,
            })),
            None => Ok(None),
        }
    }

    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> RemoteResult<()> {
        let encoded = serde_json::to_string(&fields)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, doc_id, fields)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, doc_id) DO UPDATE SET
                fields = excluded.fields,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![path.parent().as_str(), path.id(), encoded],
        )?;
        Ok(())
    }

    async fn add_document(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> RemoteResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let encoded = serde_json::to_string(&fields)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, doc_id, fields) VALUES (?1, ?2, ?3);",
            params![collection.as_str(), id.as_str(), encoded],
        )?;
        Ok(id)
    }

    async fn update_document(&self, path: &DocumentPath, fields: Fields) -> RemoteResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let raw: Option<String> = tx
            .query_row(
                "SELECT fields FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![path.parent().as_str(), path.id()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Err(RemoteError::NotFound(path.to_string()));
        };

        let mut merged = decode_fields(&raw)?;
        merged.extend(fields);
        tx.execute(
            "UPDATE documents
             SET fields = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection = ?1 AND doc_id = ?2;",
            params![
                path.parent().as_str(),
                path.id(),
                serde_json::to_string(&merged)?
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![path.parent().as_str(), path.id()],
        )?;
        Ok(())
    }
}

fn decode_fields(raw: &str) -> RemoteResult<Fields> {
    Ok(serde_json::from_str(raw)?)
}

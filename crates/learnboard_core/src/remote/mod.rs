//! Remote document-store boundary.
//!
//! # Responsibility
//! - Define the hierarchical document contract the dashboard mirrors into.
//! - Provide path types for the `topics/{id}/projects/{id}/notes/{id}` layout.
//! - Ship in-memory and SQLite-backed implementations.
//!
//! # Invariants
//! - Collection paths have an odd number of segments, document paths an even
//!   number; no segment is empty or contains `/`.
//! - `update_document` never creates a document; it fails with `NotFound`.
//! - `delete_document` of an absent document succeeds.

use crate::db::DbError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Document payload: top-level field name to JSON value.
pub type Fields = Map<String, Value>;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors raised by document-store implementations.
#[derive(Debug)]
pub enum RemoteError {
    /// Path shape is invalid.
    InvalidPath(String),
    /// Target document does not exist.
    NotFound(String),
    /// SQLite backend failure.
    Db(DbError),
    /// Persisted fields could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// Any other backend failure (network, quota, injected fault).
    Backend(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid document path: `{path}`"),
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::Backend(message) => write!(f, "document store failure: {message}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RemoteError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RemoteError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Path to a collection, e.g. `topics/math/projects`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// Path to a single document, e.g. `topics/math`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl CollectionPath {
    /// Parses a slash-separated collection path.
    pub fn parse(path: &str) -> RemoteResult<Self> {
        let segments = split_segments(path)?;
        if segments.len() % 2 == 0 {
            return Err(RemoteError::InvalidPath(path.to_string()));
        }
        Ok(Self(segments.join("/")))
    }

    /// The root `topics` collection.
    pub fn topics() -> Self {
        Self("topics".to_string())
    }

    pub fn projects(topic_id: &str) -> RemoteResult<Self> {
        Ok(DocumentPath::topic(topic_id)?.collection("projects"))
    }

    pub fn notes(topic_id: &str, project_id: &str) -> RemoteResult<Self> {
        Ok(DocumentPath::project(topic_id, project_id)?.collection("notes"))
    }

    /// Document path for `id` inside this collection.
    pub fn doc(&self, id: &str) -> RemoteResult<DocumentPath> {
        validate_segment(id, &format!("{}/{id}", self.0))?;
        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocumentPath {
    /// Parses a slash-separated document path.
    pub fn parse(path: &str) -> RemoteResult<Self> {
        let segments = split_segments(path)?;
        if segments.len() % 2 != 0 {
            return Err(RemoteError::InvalidPath(path.to_string()));
        }
        let (id, parent) = segments
            .split_last()
            .ok_or_else(|| RemoteError::InvalidPath(path.to_string()))?;
        Ok(Self {
            collection: CollectionPath(parent.join("/")),
            id: (*id).to_string(),
        })
    }

    pub fn topic(topic_id: &str) -> RemoteResult<Self> {
        CollectionPath::topics().doc(topic_id)
    }

    pub fn project(topic_id: &str, project_id: &str) -> RemoteResult<Self> {
        CollectionPath::projects(topic_id)?.doc(project_id)
    }

    pub fn note(topic_id: &str, project_id: &str, note_id: &str) -> RemoteResult<Self> {
        CollectionPath::notes(topic_id, project_id)?.doc(note_id)
    }

    /// Subcollection nested under this document.
    ///
    /// `name` is a fixed schema name, never user input.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{name}", self))
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Sort direction for ordered collection reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Field ordering for `list_documents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }
}

/// One document read from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Hierarchical document database used as the dashboard's backing store.
///
/// Implementations must be safe to share behind `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists every document in a collection, optionally ordered by one field.
    async fn list_documents(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> RemoteResult<Vec<Document>>;
    /// Reads one document.
    async fn get_document(&self, path: &DocumentPath) -> RemoteResult<Option<Document>>;
    /// Creates or fully overwrites one document.
    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> RemoteResult<()>;
    /// Creates a document with a store-generated ID and returns that ID.
    async fn add_document(&self, collection: &CollectionPath, fields: Fields)
        -> RemoteResult<String>;
    /// Merges `fields` into an existing document.
    async fn update_document(&self, path: &DocumentPath, fields: Fields) -> RemoteResult<()>;
    /// Deletes one document. Child collections are not touched.
    async fn delete_document(&self, path: &DocumentPath) -> RemoteResult<()>;
}

/// Sorts documents in place following the store-wide ordering rules.
///
/// Unordered listings are by document ID. Ordered listings compare the field
/// value; documents missing the field go last and ties fall back to ID.
/// Unlike a Firestore `orderBy` query, which drops documents lacking the
/// field, those documents are kept here.
pub fn sort_documents(documents: &mut [Document], order: Option<&OrderBy>) {
    match order {
        None => documents.sort_by(|a, b| a.id.cmp(&b.id)),
        Some(order) => documents.sort_by(|a, b| {
            let by_field = match (a.fields.get(&order.field), b.fields.get(&order.field)) {
                (Some(left), Some(right)) => {
                    let ordering = compare_values(left, right);
                    match order.direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_field.then_with(|| a.id.cmp(&b.id))
        }),
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (a, b) => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn split_segments(path: &str) -> RemoteResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').collect();
    for segment in &segments {
        validate_segment(segment, path)?;
    }
    Ok(segments)
}

fn validate_segment(segment: &str, full_path: &str) -> RemoteResult<()> {
    if segment.trim().is_empty() || segment.contains('/') {
        return Err(RemoteError::InvalidPath(full_path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{sort_documents, CollectionPath, Document, DocumentPath, OrderBy};
    use serde_json::{json, Map, Value};

    fn doc(id: &str, fields: Value) -> Document {
        let fields: Map<String, Value> = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Document {
            id: id.to_string(),
            fields,
        }
    }

    #[test]
    fn builds_nested_paths() {
        let path = DocumentPath::note("math", "p1", "n1").unwrap();
        assert_eq!(path.to_string(), "topics/math/projects/p1/notes/n1");
        assert_eq!(path.parent().as_str(), "topics/math/projects/p1/notes");
        assert_eq!(path.id(), "n1");
    }

    #[test]
    fn rejects_bad_segments() {
        assert!(DocumentPath::topic("").is_err());
        assert!(DocumentPath::topic("a/b").is_err());
        assert!(CollectionPath::parse("topics/math").is_err());
        assert!(DocumentPath::parse("topics").is_err());
        assert!(DocumentPath::parse("topics//x").is_err());
    }

    #[test]
    fn parse_round_trips_display() {
        let path = DocumentPath::parse("topics/math/projects/p1").unwrap();
        assert_eq!(path, DocumentPath::project("math", "p1").unwrap());
    }

    #[test]
    fn descending_order_puts_missing_fields_last() {
        let mut docs = vec![
            doc("a", json!({"startDate": "2024-01-01"})),
            doc("b", json!({})),
            doc("c", json!({"startDate": "2024-05-01"})),
            doc("d", json!({"startDate": "2024-01-01"})),
        ];
        sort_documents(&mut docs, Some(&OrderBy::desc("startDate")));
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn unordered_listing_sorts_by_id() {
        let mut docs = vec![doc("zeta", json!({})), doc("alpha", json!({}))];
        sort_documents(&mut docs, None);
        assert_eq!(docs[0].id, "alpha");
    }
}

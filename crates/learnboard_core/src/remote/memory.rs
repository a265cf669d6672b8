//! In-process document store.
//!
//! Keeps every collection in one mutex-guarded map. Used by tests and by
//! embedders that want remote-shaped persistence without a database file.

use super::{
    sort_documents, CollectionPath, Document, DocumentPath, DocumentStore, Fields, OrderBy,
    RemoteError, RemoteResult,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

type Collections = BTreeMap<CollectionPath, BTreeMap<String, Fields>>;

/// Mutex-guarded in-memory implementation of [`DocumentStore`].
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of documents across all collections.
    pub fn document_count(&self) -> usize {
        match self.collections.lock() {
            Ok(collections) => collections.values().map(BTreeMap::len).sum(),
            Err(_) => 0,
        }
    }

    fn lock(&self) -> RemoteResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| RemoteError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_documents(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> RemoteResult<Vec<Document>> {
        let collections = self.lock()?;
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        sort_documents(&mut documents, order);
        Ok(documents)
    }

    async fn get_document(&self, path: &DocumentPath) -> RemoteResult<Option<Document>> {
        let collections = self.lock()?;
        Ok(collections
            .get(path.parent())
            .and_then(|docs| docs.get(path.id()))
            .map(|fields| Document {
                id: path.id().to_string(),
                fields: fields.clone(),
            }))
    }

    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> RemoteResult<()> {
        let mut collections = self.lock()?;
        collections
            .entry(path.parent().clone())
            .or_default()
            .insert(path.id().to_string(), fields);
        Ok(())
    }

    async fn add_document(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> RemoteResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let mut collections = self.lock()?;
        collections
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn update_document(&self, path: &DocumentPath, fields: Fields) -> RemoteResult<()> {
        let mut collections = self.lock()?;
        let existing = collections
            .get_mut(path.parent())
            .and_then(|docs| docs.get_mut(path.id()))
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> RemoteResult<()> {
        let mut collections = self.lock()?;
        if let Some(docs) = collections.get_mut(path.parent()) {
            docs.remove(path.id());
            if docs.is_empty() {
                collections.remove(path.parent());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryDocumentStore;
    use crate::remote::{
        CollectionPath, DocumentPath, DocumentStore, Fields, OrderBy, RemoteError,
    };
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[tokio::test]
    async fn update_merges_and_requires_existing_document() {
        let store = InMemoryDocumentStore::new();
        let path = DocumentPath::topic("math").unwrap();

        let err = store
            .update_document(&path, fields(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));

        store
            .set_document(&path, fields(json!({"name": "Math", "color": "red"})))
            .await
            .unwrap();
        store
            .update_document(&path, fields(json!({"name": "Mathematics"})))
            .await
            .unwrap();

        let doc = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], json!("Mathematics"));
        assert_eq!(doc.fields["color"], json!("red"));
    }

    #[tokio::test]
    async fn add_generates_ids_and_list_orders() {
        let store = InMemoryDocumentStore::new();
        let notes = CollectionPath::notes("math", "p1").unwrap();
        store
            .add_document(&notes, fields(json!({"date": "2024-01-01"})))
            .await
            .unwrap();
        let newest = store
            .add_document(&notes, fields(json!({"date": "2024-06-01"})))
            .await
            .unwrap();

        let listed = store
            .list_documents(&notes, Some(&OrderBy::desc("date")))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newest);
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_leaves_children() {
        let store = InMemoryDocumentStore::new();
        let topic = DocumentPath::topic("math").unwrap();
        let project = DocumentPath::project("math", "p1").unwrap();
        store.set_document(&topic, Fields::new()).await.unwrap();
        store.set_document(&project, Fields::new()).await.unwrap();

        store.delete_document(&topic).await.unwrap();
        store.delete_document(&topic).await.unwrap();

        assert!(store.get_document(&topic).await.unwrap().is_none());
        assert!(store.get_document(&project).await.unwrap().is_some());
        assert_eq!(store.document_count(), 1);
    }
}

use learnboard_core::db::migrations::{current_user_version, latest_version};
use learnboard_core::db::{open_db, open_db_in_memory, DbError};
use learnboard_core::{
    CollectionPath, DashboardStore, DocumentPath, DocumentStore, Fields, LoadOutcome, Note,
    OrderBy, Project, ProjectStatus, RemoteError, SqliteDocumentStore,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

#[test]
fn migrations_create_documents_table() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());

    let mut stmt = conn.prepare("PRAGMA table_info(documents);").unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    assert!(columns.contains(&"collection".to_string()));
    assert!(columns.contains(&"doc_id".to_string()));
    assert!(columns.contains(&"fields".to_string()));
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    }
    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion { db_version: 99, .. }
    ));
}

#[tokio::test]
async fn set_get_update_delete_round() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let path = DocumentPath::project("math", "p1").unwrap();

    assert!(store.get_document(&path).await.unwrap().is_none());
    assert!(matches!(
        store.update_document(&path, Fields::new()).await,
        Err(RemoteError::NotFound(_))
    ));

    store
        .set_document(&path, fields(json!({"title": "Calculus", "status": "not-started"})))
        .await
        .unwrap();
    store
        .update_document(&path, fields(json!({"status": "completed"})))
        .await
        .unwrap();
    let doc = store.get_document(&path).await.unwrap().unwrap();
    assert_eq!(doc.fields["title"], json!("Calculus"));
    assert_eq!(doc.fields["status"], json!("completed"));

    store.delete_document(&path).await.unwrap();
    store.delete_document(&path).await.unwrap();
    assert!(store.get_document(&path).await.unwrap().is_none());
}

#[tokio::test]
async fn listing_is_scoped_to_collection_and_ordered() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let notes = CollectionPath::notes("math", "p1").unwrap();
    let other = CollectionPath::notes("math", "p2").unwrap();

    store
        .set_document(&notes.doc("a").unwrap(), fields(json!({"date": "2024-01-01"})))
        .await
        .unwrap();
    store
        .set_document(&notes.doc("b").unwrap(), fields(json!({"date": "2024-03-01"})))
        .await
        .unwrap();
    let generated = store
        .add_document(&notes, fields(json!({"date": "2024-02-01"})))
        .await
        .unwrap();
    store
        .set_document(&other.doc("c").unwrap(), fields(json!({"date": "2025-01-01"})))
        .await
        .unwrap();

    let listed = store
        .list_documents(&notes, Some(&OrderBy::desc("date")))
        .await
        .unwrap();
    let ids: Vec<&str> = listed.iter().map(|doc| doc.id.as_str()).collect();
    assert_eq!(ids, vec!["b", generated.as_str(), "a"]);
}

#[tokio::test]
async fn dashboard_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.sqlite3");

    {
        let remote = Arc::new(SqliteDocumentStore::open(&path).unwrap());
        let mut store = DashboardStore::with_remote(remote);
        store.load_initial_data().await;
        store.create_topic("Rust").await.unwrap();
        store
            .add_project("rust", Project::new("borrowck", "Borrow checker", "2024-05-01"))
            .await
            .unwrap();
        store
            .update_project_status("borrowck", ProjectStatus::Completed)
            .await
            .unwrap();
        store
            .add_note("borrowck", Note::new("2024-05-02", "two-phase borrows"))
            .await
            .unwrap();
    }

    let remote = Arc::new(SqliteDocumentStore::open(&path).unwrap());
    let mut reopened = DashboardStore::with_remote(remote);
    assert!(matches!(
        reopened.load_initial_data().await,
        LoadOutcome::Remote(_)
    ));
    assert_eq!(reopened.topic("rust").unwrap().name, "Rust");
    assert_eq!(reopened.topic_progress("rust"), (1, 1));
    assert_eq!(
        reopened.project_notes("borrowck")[0].content,
        "two-phase borrows"
    );
}

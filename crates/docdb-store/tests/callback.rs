mod common;
use common::*;

use std::sync::Arc;

use bson::doc;
use docdb_db::{CallbackExt, DbError, DocumentDatabase};
use docdb_query::{FindQuery, UpdateFieldCommand};
use docdb_store::MemoryStore;
use tokio::sync::oneshot;

#[tokio::test]
async fn create_then_read_with_callbacks() {
    let store = Arc::new(MemoryStore::new());

    let (tx, rx) = oneshot::channel();
    store.create_with(widget("a"), move |res| {
        let _ = tx.send(res);
    });
    let created = rx.await.unwrap().unwrap();

    let (tx, rx) = oneshot::channel();
    store.read_with(id_of(&created), move |res| {
        let _ = tx.send(res);
    });
    assert_eq!(rx.await.unwrap().unwrap(), Some(created));
}

#[tokio::test]
async fn callback_receives_errors() {
    let store = Arc::new(MemoryStore::new());
    let (tx, rx) = oneshot::channel();
    store.delete_with(String::new(), move |res| {
        let _ = tx.send(res);
    });
    assert!(rx.await.unwrap().unwrap_err().is_validation());
}

#[tokio::test]
async fn update_and_find_with_callbacks() {
    let (store, created) = seeded(2).await;
    let store = Arc::new(store);
    let id = id_of(&created[0]);

    let (tx, rx) = oneshot::channel();
    store.update_with(
        doc! { "_id": id.as_str() },
        vec![UpdateFieldCommand::set("color", "green")],
        move |res| {
            let _ = tx.send(res);
        },
    );
    let updated = rx.await.unwrap().unwrap();
    assert_eq!(updated.get_str("color").unwrap(), "green");

    let (tx, rx) = oneshot::channel();
    store.find_with(
        FindQuery::new().conditions(doc! { "color": "green" }),
        move |res| {
            let _ = tx.send(res);
        },
    );
    let found = rx.await.unwrap().unwrap();
    assert_eq!(found, vec![updated]);
    assert_eq!(store.len(), 2);
}

#[test]
fn without_runtime_reports_backend_error() {
    let store: Arc<dyn DocumentDatabase> = Arc::new(MemoryStore::new());
    let (tx, rx) = std::sync::mpsc::channel();
    store.read_with(MISSING_ID.to_string(), move |res| {
        let _ = tx.send(res);
    });
    assert!(matches!(rx.recv().unwrap(), Err(DbError::Backend(_))));
}

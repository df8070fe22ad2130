#![allow(dead_code)]

use bson::{Document, doc};
use docdb_db::DocumentDatabase;
use docdb_store::MemoryStore;

pub const MISSING_ID: &str = "123456789012345678901234";

pub fn widget(name: &str) -> Document {
    doc! {
        "name": name,
        "tags": ["red"],
        "parts": [ { "part_id": format!("{name}-p1"), "qty": 1 } ]
    }
}

pub async fn seeded(count: usize) -> (MemoryStore, Vec<Document>) {
    let store = MemoryStore::new();
    let mut created = Vec::with_capacity(count);
    for i in 0..count {
        created.push(store.create(&widget(&format!("w{i}"))).await.unwrap());
    }
    (store, created)
}

pub fn id_of(doc: &Document) -> String {
    docdb_db::document_id(doc).unwrap()
}

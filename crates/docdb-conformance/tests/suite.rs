mod common;
use common::*;

use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use docdb_client::{LoopbackTransport, RemoteDatabase};
use docdb_conformance::{CaseOutcome, Decision, Harness, TestFields};
use docdb_db::{DbError, DocumentDatabase, SupportedFeatures};
use docdb_query::{Conditions, FindQuery, UpdateFieldCommand, VERSION_FIELD};
use docdb_store::MemoryStore;

fn harness(db: Arc<dyn DocumentDatabase>, fields: TestFields, features: SupportedFeatures) -> Harness {
    Harness::new(db, widget, fields, features)
}

#[tokio::test]
async fn memory_store_passes_everything() {
    let h = harness(
        Arc::new(MemoryStore::new()),
        widget_fields(),
        SupportedFeatures::all(),
    );
    let plan = h.build();
    assert_eq!(plan.cases.len(), TOTAL_CASES);
    assert_eq!(plan.skipped(), 0);

    let report = h.run().await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.passed(), TOTAL_CASES);
}

#[tokio::test]
async fn missing_features_skip_instead_of_failing() {
    let store = Arc::new(MemoryStore::new());
    let h = harness(store, widget_fields(), SupportedFeatures::none());

    let plan = h.build();
    // replace 2, update 15, cursor 6
    assert_eq!(plan.skipped(), 23);

    let report = h.run().await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.skipped(), 23);
    assert_eq!(report.passed(), TOTAL_CASES - 23);
    assert_eq!(
        report.outcome_of("should return 11 items if count = 11"),
        Some(&CaseOutcome::Skipped)
    );
}

#[tokio::test]
async fn missing_roles_skip_dependent_cases() {
    let mut fields = widget_fields();
    fields.obj_array = None;
    let h = harness(
        Arc::new(MemoryStore::new()),
        fields,
        SupportedFeatures::all(),
    );
    let plan = h.build();
    let skipped: Vec<_> = plan
        .cases
        .iter()
        .filter(|c| c.decision == Decision::Skip)
        .map(|c| c.name)
        .collect();
    assert_eq!(skipped.len(), 7, "{skipped:?}");
    assert!(skipped.contains(&"should remove an existing element from an array of objects"));

    let report = h.run().await;
    assert!(report.is_success(), "{report}");
}

#[tokio::test]
async fn store_with_disabled_replace_still_conforms() {
    let mut features = SupportedFeatures::all();
    features.replace = false;
    let store = Arc::new(MemoryStore::with_config(docdb_store::MemoryConfig { features }));
    let report = harness(store, widget_fields(), features).run().await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.skipped(), 2);
}

#[tokio::test]
async fn remote_database_passes_through_loopback() {
    let remote = RemoteDatabase::new(LoopbackTransport::new(Arc::new(MemoryStore::new())));
    let report = harness(Arc::new(remote), widget_fields(), SupportedFeatures::all())
        .run()
        .await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.passed(), TOTAL_CASES);
}

/// Hides `_obj_ver` from created documents.
struct Unversioned(MemoryStore);

#[async_trait]
impl DocumentDatabase for Unversioned {
    async fn create(&self, doc: &Document) -> Result<Document, DbError> {
        let mut created = self.0.create(doc).await?;
        created.remove(VERSION_FIELD);
        Ok(created)
    }

    async fn read(&self, id: &str) -> Result<Option<Document>, DbError> {
        self.0.read(id).await
    }

    async fn read_many(&self, ids: &[String]) -> Result<Vec<Document>, DbError> {
        self.0.read_many(ids).await
    }

    async fn replace(&self, doc: &Document) -> Result<Document, DbError> {
        self.0.replace(doc).await
    }

    async fn update(
        &self,
        conditions: &Conditions,
        updates: &[UpdateFieldCommand],
    ) -> Result<Document, DbError> {
        self.0.update(conditions, updates).await
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        self.0.delete(id).await
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, DbError> {
        self.0.find(query).await
    }
}

#[tokio::test]
async fn broken_backend_is_reported() {
    let db = Arc::new(Unversioned(MemoryStore::new()));
    let report = harness(db, widget_fields(), SupportedFeatures::all()).run().await;
    assert!(!report.is_success());
    assert!(matches!(
        report.outcome_of("should create a new object, containing an object version of 1"),
        Some(CaseOutcome::Failed(_))
    ));
    assert!(matches!(
        report.outcome_of("should remove an existing element from an array of simple types"),
        Some(CaseOutcome::Failed(_))
    ));
    assert_eq!(
        report.outcome_of("should not be able to read after delete"),
        Some(&CaseOutcome::Passed)
    );
}

use std::sync::Arc;

use bson::{Bson, Document, doc};
use docdb_db::{DbError, DocumentDatabase, SupportedFeatures, document_id, object_version};
use docdb_query::{ID_FIELD, UpdateFieldCommand, VERSION_FIELD};

use crate::check::{ensure_eq, expect_version};
use crate::failure::{CaseFailure, setup};
use crate::fields::{DocumentFactory, ObjArray, StringArray, TestFields};

/// Everything a case can touch: the database under test, the document
/// factory, the field roles and the feature matrix.
pub struct Context {
    db: Arc<dyn DocumentDatabase>,
    factory: DocumentFactory,
    fields: TestFields,
    features: SupportedFeatures,
}

/// A document as created and as returned by the update applied to it.
pub(crate) struct Updated {
    pub created: Document,
    pub updated: Document,
}

impl Context {
    pub fn new(
        db: Arc<dyn DocumentDatabase>,
        factory: DocumentFactory,
        fields: TestFields,
        features: SupportedFeatures,
    ) -> Self {
        Self {
            db,
            factory,
            fields,
            features,
        }
    }

    pub fn db(&self) -> &dyn DocumentDatabase {
        self.db.as_ref()
    }

    pub fn fields(&self) -> &TestFields {
        &self.fields
    }

    pub fn features(&self) -> &SupportedFeatures {
        &self.features
    }

    pub fn new_document(&self) -> Document {
        (self.factory)()
    }

    // ── Field roles ─────────────────────────────────────────────

    pub(crate) fn populated_string(&self) -> Result<&str, CaseFailure> {
        self.fields
            .populated_string
            .as_deref()
            .ok_or_else(|| setup("populated_string is not set"))
    }

    pub(crate) fn unpopulated_string(&self) -> Result<&str, CaseFailure> {
        self.fields
            .unpopulated_string
            .as_deref()
            .ok_or_else(|| setup("unpopulated_string is not set"))
    }

    pub(crate) fn unique_key(&self) -> Result<&str, CaseFailure> {
        self.fields
            .unique_key_fieldname
            .as_deref()
            .ok_or_else(|| setup("unique_key_fieldname is not set"))
    }

    pub(crate) fn string_array(&self) -> Result<&StringArray, CaseFailure> {
        self.fields
            .string_array
            .as_ref()
            .ok_or_else(|| setup("string_array is not set"))
    }

    pub(crate) fn obj_array(&self) -> Result<&ObjArray, CaseFailure> {
        self.fields
            .obj_array
            .as_ref()
            .ok_or_else(|| setup("obj_array is not set"))
    }

    /// The object array together with its key field.
    pub(crate) fn keyed_obj_array(&self) -> Result<(&ObjArray, &str), CaseFailure> {
        let array = self.obj_array()?;
        let key = array
            .key_field
            .as_deref()
            .ok_or_else(|| setup("obj_array.key_field is not set"))?;
        Ok((array, key))
    }

    // ── Calls ───────────────────────────────────────────────────

    /// Create `doc` and return the stored form with its `_id`.
    pub(crate) async fn create(&self, doc: &Document) -> Result<(Document, String), CaseFailure> {
        let created = self.db.create(doc).await?;
        let id = document_id(&created)
            .ok_or_else(|| CaseFailure::Assertion("created document has no _id".into()))?;
        Ok((created, id))
    }

    /// Apply `command` to a created document, addressed by `_id` and, when it
    /// carries one, its current `_obj_ver`.
    pub(crate) async fn try_update(
        &self,
        created: &Document,
        command: UpdateFieldCommand,
    ) -> Result<Document, DbError> {
        let mut conditions = doc! {};
        if let Some(id) = created.get(ID_FIELD) {
            conditions.insert(ID_FIELD, id.clone());
        }
        if let Some(version) = object_version(created) {
            conditions.insert(VERSION_FIELD, Bson::Int64(version));
        }
        self.db.update(&conditions, &[command]).await
    }

    /// Create `doc`, apply `command`, and check the update kept the `_id` and
    /// advanced `_obj_ver` by exactly one.
    pub(crate) async fn create_then_update(
        &self,
        doc: &Document,
        command: UpdateFieldCommand,
    ) -> Result<Updated, CaseFailure> {
        let (created, id) = self.create(doc).await?;
        let updated = self.try_update(&created, command).await?;
        ensure_eq("updated _id", document_id(&updated), Some(id))?;
        let before = object_version(&created)
            .ok_or_else(|| CaseFailure::Assertion("created document has no _obj_ver".into()))?;
        expect_version(&updated, before + 1)?;
        Ok(Updated { created, updated })
    }
}

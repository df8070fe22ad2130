use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use docdb_query::{Conditions, FindQuery, UpdateFieldCommand};

use crate::error::DbError;

/// The operations every document store must provide.
///
/// Every call is atomic from the caller's point of view and reports failure
/// through its `Result`. Returned documents are always fresh copies; inputs are
/// borrowed and never modified.
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    /// Store a new document. Fails if `doc` already carries `_id`. The result
    /// carries the assigned `_id` and `_obj_ver = 1`.
    async fn create(&self, doc: &Document) -> Result<Document, DbError>;

    /// Fetch one document. A well-formed id that matches nothing yields `None`.
    async fn read(&self, id: &str) -> Result<Option<Document>, DbError>;

    /// Fetch a batch in unspecified order. Ids that match nothing contribute
    /// nothing; callers correlate misses themselves.
    async fn read_many(&self, ids: &[String]) -> Result<Vec<Document>, DbError>;

    /// Substitute a whole stored document, bumping `_obj_ver`.
    ///
    /// Deprecated in favor of [`update`](Self::update); gated by the `replace`
    /// capability.
    async fn replace(&self, doc: &Document) -> Result<Document, DbError>;

    /// Apply every command to the single document matching `conditions`, all or
    /// nothing, bumping `_obj_ver` by one.
    async fn update(
        &self,
        conditions: &Conditions,
        updates: &[UpdateFieldCommand],
    ) -> Result<Document, DbError>;

    /// Remove a document. Deleting an id that matches nothing succeeds.
    async fn delete(&self, id: &str) -> Result<(), DbError>;

    /// One page of matching documents under the backend's ordering. Never an
    /// error when nothing matches.
    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, DbError>;
}

#[async_trait]
impl<D: DocumentDatabase + ?Sized> DocumentDatabase for Arc<D> {
    async fn create(&self, doc: &Document) -> Result<Document, DbError> {
        (**self).create(doc).await
    }

    async fn read(&self, id: &str) -> Result<Option<Document>, DbError> {
        (**self).read(id).await
    }

    async fn read_many(&self, ids: &[String]) -> Result<Vec<Document>, DbError> {
        (**self).read_many(ids).await
    }

    async fn replace(&self, doc: &Document) -> Result<Document, DbError> {
        (**self).replace(doc).await
    }

    async fn update(
        &self,
        conditions: &Conditions,
        updates: &[UpdateFieldCommand],
    ) -> Result<Document, DbError> {
        (**self).update(conditions, updates).await
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        (**self).delete(id).await
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, DbError> {
        (**self).find(query).await
    }
}

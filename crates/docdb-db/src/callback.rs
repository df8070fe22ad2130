use std::sync::Arc;

use bson::Document;
use docdb_query::{Conditions, FindQuery, UpdateFieldCommand};

use crate::contract::DocumentDatabase;
use crate::error::DbError;

/// Callback-style adapter over the async contract.
///
/// Each `*_with` call spawns the operation onto the current tokio runtime and
/// returns immediately; `done` receives the outcome. Supplying a callback
/// replaces the future, so nothing is returned to await. Without a runtime the
/// callback is invoked at once with a backend error.
pub trait CallbackExt {
    fn create_with(&self, doc: Document, done: impl FnOnce(Result<Document, DbError>) + Send + 'static);
    fn read_with(&self, id: String, done: impl FnOnce(Result<Option<Document>, DbError>) + Send + 'static);
    fn read_many_with(&self, ids: Vec<String>, done: impl FnOnce(Result<Vec<Document>, DbError>) + Send + 'static);
    fn replace_with(&self, doc: Document, done: impl FnOnce(Result<Document, DbError>) + Send + 'static);
    fn update_with(
        &self,
        conditions: Conditions,
        updates: Vec<UpdateFieldCommand>,
        done: impl FnOnce(Result<Document, DbError>) + Send + 'static,
    );
    fn delete_with(&self, id: String, done: impl FnOnce(Result<(), DbError>) + Send + 'static);
    fn find_with(&self, query: FindQuery, done: impl FnOnce(Result<Vec<Document>, DbError>) + Send + 'static);
}

fn spawn<T, Fut>(fut: Fut, done: impl FnOnce(Result<T, DbError>) + Send + 'static)
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, DbError>> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { done(fut.await) });
        }
        Err(e) => {
            tracing::warn!(error = %e, "callback call made outside of a tokio runtime");
            done(Err(DbError::backend(format!("no async runtime: {e}"))));
        }
    }
}

impl<D: DocumentDatabase + ?Sized + 'static> CallbackExt for Arc<D> {
    fn create_with(&self, doc: Document, done: impl FnOnce(Result<Document, DbError>) + Send + 'static) {
        let db = Arc::clone(self);
        spawn(async move { db.create(&doc).await }, done);
    }

    fn read_with(&self, id: String, done: impl FnOnce(Result<Option<Document>, DbError>) + Send + 'static) {
        let db = Arc::clone(self);
        spawn(async move { db.read(&id).await }, done);
    }

    fn read_many_with(&self, ids: Vec<String>, done: impl FnOnce(Result<Vec<Document>, DbError>) + Send + 'static) {
        let db = Arc::clone(self);
        spawn(async move { db.read_many(&ids).await }, done);
    }

    fn replace_with(&self, doc: Document, done: impl FnOnce(Result<Document, DbError>) + Send + 'static) {
        let db = Arc::clone(self);
        spawn(async move { db.replace(&doc).await }, done);
    }

    fn update_with(
        &self,
        conditions: Conditions,
        updates: Vec<UpdateFieldCommand>,
        done: impl FnOnce(Result<Document, DbError>) + Send + 'static,
    ) {
        let db = Arc::clone(self);
        spawn(async move { db.update(&conditions, &updates).await }, done);
    }

    fn delete_with(&self, id: String, done: impl FnOnce(Result<(), DbError>) + Send + 'static) {
        let db = Arc::clone(self);
        spawn(async move { db.delete(&id).await }, done);
    }

    fn find_with(&self, query: FindQuery, done: impl FnOnce(Result<Vec<Document>, DbError>) + Send + 'static) {
        let db = Arc::clone(self);
        spawn(async move { db.find(&query).await }, done);
    }
}

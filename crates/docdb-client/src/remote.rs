use async_trait::async_trait;
use bson::Document;
use docdb_db::{DbError, DocumentDatabase};
use docdb_query::{Conditions, FindQuery, UpdateFieldCommand};
use docdb_server::{Request, Response};

use crate::transport::{Transport, decode, encode};

/// `DocumentDatabase` backed by a remote server reached through `T`.
///
/// Server errors are rebuilt with their original kind and message; failures
/// of the transport itself surface as `DbError::Backend`.
pub struct RemoteDatabase<T> {
    transport: T,
}

impl<T: Transport> RemoteDatabase<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn request(&self, request: Request) -> Result<Response, DbError> {
        let action = request.action;
        let bytes = encode(&request)?;
        let reply = self.transport.round_trip(bytes).await.inspect_err(|e| {
            tracing::warn!(%action, error = %e, "round trip failed");
        })?;
        Ok(decode(&reply)?)
    }
}

#[async_trait]
impl<T: Transport> DocumentDatabase for RemoteDatabase<T> {
    async fn create(&self, doc: &Document) -> Result<Document, DbError> {
        self.request(Request::create(doc.clone())).await?.into_one()
    }

    async fn read(&self, id: &str) -> Result<Option<Document>, DbError> {
        self.request(Request::read(id)).await?.into_optional()
    }

    async fn read_many(&self, ids: &[String]) -> Result<Vec<Document>, DbError> {
        self.request(Request::read_many(ids.to_vec()))
            .await?
            .into_many()
    }

    async fn replace(&self, doc: &Document) -> Result<Document, DbError> {
        self.request(Request::replace(doc.clone())).await?.into_one()
    }

    async fn update(
        &self,
        conditions: &Conditions,
        updates: &[UpdateFieldCommand],
    ) -> Result<Document, DbError> {
        self.request(Request::update(conditions.clone(), updates.to_vec()))
            .await?
            .into_one()
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        self.request(Request::delete(id)).await?.into_unit()
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, DbError> {
        self.request(Request::find(query.clone())).await?.into_many()
    }
}

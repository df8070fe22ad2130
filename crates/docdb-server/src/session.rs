use docdb_db::{DbError, DocumentDatabase, ID_INVALID, ID_OR_IDS_INVALID};
use docdb_query::ID_FIELD;

use crate::protocol::{Action, Request, Response};

/// Serves envelope requests against one database.
pub struct Session<D> {
    db: D,
}

impl<D: DocumentDatabase> Session<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action;
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(%action, error = %e, "request failed");
                Response::failed(e)
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Response, DbError> {
        let Request {
            action,
            obj,
            query,
            updates,
        } = request;
        let query = query.unwrap_or_default();

        match action {
            Action::Create => {
                let obj = obj.ok_or_else(|| DbError::validation("obj is required"))?;
                Ok(Response::one(self.db.create(&obj).await?))
            }
            Action::Read => match (query.id, query.ids) {
                (Some(id), _) => Ok(Response::maybe_one(self.db.read(&id).await?)),
                (None, Some(ids)) => Ok(Response::many(self.db.read_many(&ids).await?)),
                (None, None) => Err(DbError::validation(ID_OR_IDS_INVALID)),
            },
            Action::Replace => {
                let obj = obj.ok_or_else(|| DbError::validation("obj is required"))?;
                Ok(Response::one(self.db.replace(&obj).await?))
            }
            Action::Update => {
                let mut conditions = query.conditions.unwrap_or_default();
                if let Some(id) = query.id {
                    conditions.insert(ID_FIELD, id);
                }
                let updates = updates.unwrap_or_default();
                Ok(Response::one(self.db.update(&conditions, &updates).await?))
            }
            Action::Delete => {
                let id = query.id.ok_or_else(|| DbError::validation(ID_INVALID))?;
                self.db.delete(&id).await?;
                Ok(Response::empty())
            }
            Action::Find => {
                let docs = self.db.find(&query.into_find_query()).await?;
                Ok(Response::many(docs))
            }
        }
    }
}

use std::fmt;

use bson::Document;
use docdb_db::DbError;
use docdb_query::{Conditions, Cursor, Fields, FindQuery, Sort, UpdateFieldCommand};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Replace,
    Delete,
    Find,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Replace => "replace",
            Action::Delete => "delete",
            Action::Find => "find",
        };
        f.write_str(name)
    }
}

/// Selection part of a request. `id` addresses one document, `ids` a batch;
/// the rest mirrors `FindQuery`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub conditions: Option<Conditions>,
    #[serde(default)]
    pub fields: Option<Fields>,
    #[serde(default)]
    pub sort: Option<Sort>,
    #[serde(default)]
    pub cursor: Option<Cursor>,
}

impl RequestQuery {
    pub fn into_find_query(self) -> FindQuery {
        FindQuery {
            conditions: self.conditions,
            fields: self.fields,
            sort: self.sort,
            cursor: self.cursor,
        }
    }
}

impl From<FindQuery> for RequestQuery {
    fn from(query: FindQuery) -> Self {
        Self {
            conditions: query.conditions,
            fields: query.fields,
            sort: query.sort,
            cursor: query.cursor,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub action: Action,
    #[serde(default)]
    pub obj: Option<Document>,
    #[serde(default)]
    pub query: Option<RequestQuery>,
    #[serde(default)]
    pub updates: Option<Vec<UpdateFieldCommand>>,
}

impl Request {
    fn new(action: Action) -> Self {
        Self {
            action,
            obj: None,
            query: None,
            updates: None,
        }
    }

    fn with_query(action: Action, query: RequestQuery) -> Self {
        Self {
            query: Some(query),
            ..Self::new(action)
        }
    }

    pub fn create(obj: Document) -> Self {
        Self {
            obj: Some(obj),
            ..Self::new(Action::Create)
        }
    }

    pub fn read(id: impl Into<String>) -> Self {
        Self::with_query(
            Action::Read,
            RequestQuery {
                id: Some(id.into()),
                ..Default::default()
            },
        )
    }

    pub fn read_many(ids: Vec<String>) -> Self {
        Self::with_query(
            Action::Read,
            RequestQuery {
                ids: Some(ids),
                ..Default::default()
            },
        )
    }

    pub fn replace(obj: Document) -> Self {
        Self {
            obj: Some(obj),
            ..Self::new(Action::Replace)
        }
    }

    pub fn update(conditions: Conditions, updates: Vec<UpdateFieldCommand>) -> Self {
        Self {
            updates: Some(updates),
            ..Self::with_query(
                Action::Update,
                RequestQuery {
                    conditions: Some(conditions),
                    ..Default::default()
                },
            )
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self::with_query(
            Action::Delete,
            RequestQuery {
                id: Some(id.into()),
                ..Default::default()
            },
        )
    }

    pub fn find(query: FindQuery) -> Self {
        Self::with_query(Action::Find, query.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseData {
    One(Document),
    Many(Vec<Document>),
}

/// Outcome envelope. Exactly one of `error` and the success fields is set;
/// a request that succeeds with nothing to return (delete, read of an absent
/// id) carries neither `error` nor `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub error: Option<DbError>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub data: Option<ResponseData>,
}

impl Response {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failed(error: DbError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn one(doc: Document) -> Self {
        Self {
            total_count: Some(1),
            data: Some(ResponseData::One(doc)),
            ..Self::default()
        }
    }

    pub fn maybe_one(doc: Option<Document>) -> Self {
        match doc {
            Some(doc) => Self::one(doc),
            None => Self {
                total_count: Some(0),
                ..Self::default()
            },
        }
    }

    pub fn many(docs: Vec<Document>) -> Self {
        Self {
            total_count: Some(docs.len() as u64),
            data: Some(ResponseData::Many(docs)),
            ..Self::default()
        }
    }

    // ── Decoding ────────────────────────────────────────────────

    fn check(self) -> Result<Option<ResponseData>, DbError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }

    pub fn into_unit(self) -> Result<(), DbError> {
        self.check().map(|_| ())
    }

    pub fn into_optional(self) -> Result<Option<Document>, DbError> {
        match self.check()? {
            Some(ResponseData::One(doc)) => Ok(Some(doc)),
            None => Ok(None),
            Some(other) => Err(unexpected(&other)),
        }
    }

    pub fn into_one(self) -> Result<Document, DbError> {
        match self.check()? {
            Some(ResponseData::One(doc)) => Ok(doc),
            None => Err(DbError::backend("unexpected response: no data")),
            Some(other) => Err(unexpected(&other)),
        }
    }

    pub fn into_many(self) -> Result<Vec<Document>, DbError> {
        match self.check()? {
            Some(ResponseData::Many(docs)) => Ok(docs),
            None => Ok(Vec::new()),
            Some(other) => Err(unexpected(&other)),
        }
    }
}

fn unexpected(data: &ResponseData) -> DbError {
    let shape = match data {
        ResponseData::One(_) => "one",
        ResponseData::Many(_) => "many",
    };
    DbError::backend(format!("unexpected response: data={shape}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn constructors_fill_the_right_slots() {
        let r = Request::read("abc");
        assert_eq!(r.action, Action::Read);
        assert_eq!(r.query.unwrap().id.as_deref(), Some("abc"));

        let r = Request::update(doc! { "a": 1 }, vec![UpdateFieldCommand::unset("b")]);
        assert_eq!(r.query.unwrap().conditions, Some(doc! { "a": 1 }));
        assert_eq!(r.updates.unwrap().len(), 1);

        let r = Request::find(FindQuery::new().cursor(Cursor::count(3)));
        assert_eq!(r.query.unwrap().cursor, Some(Cursor::count(3)));
    }

    #[test]
    fn error_wins_over_data() {
        let r = Response::failed(DbError::NoMatch);
        assert_eq!(r.clone().into_unit(), Err(DbError::NoMatch));
        assert_eq!(r.into_many(), Err(DbError::NoMatch));
    }

    #[test]
    fn shapes() {
        assert_eq!(Response::maybe_one(None).into_optional(), Ok(None));
        assert_eq!(Response::many(vec![]).total_count, Some(0));
        assert!(Response::many(vec![doc! {}]).into_one().is_err());
        assert_eq!(Response::empty().into_many(), Ok(vec![]));
    }

    #[test]
    fn action_names() {
        assert_eq!(Action::Replace.to_string(), "replace");
    }
}

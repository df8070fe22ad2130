use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;

/// Backend-specific match descriptor. Passed through the contract untouched.
pub type Conditions = bson::Document;

/// Backend-specific projection descriptor.
pub type Fields = Vec<String>;

/// Backend-specific ordering descriptor: `{ field: 1 | -1 }`.
pub type Sort = bson::Document;

/// Arguments of a `find` call, bundled for transports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindQuery {
    #[serde(default)]
    pub conditions: Option<Conditions>,
    #[serde(default)]
    pub fields: Option<Fields>,
    #[serde(default)]
    pub sort: Option<Sort>,
    #[serde(default)]
    pub cursor: Option<Cursor>,
}

impl FindQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// The effective window, defaulting to `start_offset = 0, count = 10`.
    pub fn window(&self) -> Cursor {
        self.cursor.unwrap_or_default()
    }
}

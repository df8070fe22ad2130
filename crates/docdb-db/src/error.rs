use docdb_query::{ParseError, PathError};
use serde::{Deserialize, Serialize};

pub const ID_NOT_ALLOWED_FOR_CREATE: &str = "_id isnt allowed for create";
pub const ID_OR_IDS_INVALID: &str = "_id_or_ids is invalid";
pub const ID_INVALID: &str = "_id is invalid";

/// Failure outcome of a contract operation.
///
/// A missing document is not an error: `read` yields `None` and `delete`
/// succeeds. Validation messages are literal and stable; callers match on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "message")]
pub enum DbError {
    #[error("{0}")]
    Validation(String),

    #[error("unsupported capability: {0}")]
    Unsupported(String),

    #[error("no document matches the update conditions")]
    NoMatch,

    #[error("update conditions match {0} documents, a unique match is required")]
    AmbiguousMatch(usize),

    #[error("_obj_ver conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: i64, actual: i64 },

    #[error("{0}")]
    Backend(String),
}

impl DbError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DbError::Validation(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        DbError::Backend(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DbError::Validation(_))
    }
}

impl From<ParseError> for DbError {
    fn from(e: ParseError) -> Self {
        DbError::Validation(e.0)
    }
}

impl From<PathError> for DbError {
    fn from(e: PathError) -> Self {
        DbError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_literal() {
        let e = DbError::validation(ID_NOT_ALLOWED_FOR_CREATE);
        assert_eq!(e.to_string(), "_id isnt allowed for create");
    }

    #[test]
    fn parse_errors_become_validation() {
        let e: DbError = ParseError("cmd is required".into()).into();
        assert_eq!(e, DbError::Validation("cmd is required".into()));
    }

    #[test]
    fn round_trips_through_json() {
        let e = DbError::VersionConflict { expected: 1, actual: 2 };
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(serde_json::from_str::<DbError>(&json).unwrap(), e);

        let json = serde_json::to_value(DbError::validation(ID_INVALID)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "Validation", "message": "_id is invalid" }));
    }

    #[test]
    fn payload_shapes_on_the_wire() {
        let conflict = DbError::VersionConflict { expected: 1, actual: 2 };
        assert_eq!(
            serde_json::to_value(&conflict).unwrap(),
            serde_json::json!({ "kind": "VersionConflict", "message": { "expected": 1, "actual": 2 } })
        );
        assert_eq!(
            serde_json::to_value(DbError::AmbiguousMatch(3)).unwrap(),
            serde_json::json!({ "kind": "AmbiguousMatch", "message": 3 })
        );
        assert_eq!(
            serde_json::to_value(DbError::NoMatch).unwrap(),
            serde_json::json!({ "kind": "NoMatch" })
        );
        assert_eq!(conflict.to_string(), "_obj_ver conflict: expected 1, found 2");
    }
}

use std::fmt::Debug;

use bson::{Bson, Document};
use docdb_db::{DbError, document_id, object_version};
use docdb_query::{deep_equal_marshalled, documents_equal, get_value};

use crate::failure::{CaseFailure, CaseResult, ensure, setup};

pub(crate) fn ensure_eq<T: PartialEq + Debug>(what: &str, actual: T, expected: T) -> CaseResult {
    ensure(actual == expected, || {
        format!("{what}: expected {expected:?}, got {actual:?}")
    })
}

/// Value equality under the comparator.
pub(crate) fn expect_value(what: &str, actual: Option<&Bson>, expected: Option<&Bson>) -> CaseResult {
    ensure(deep_equal_marshalled(actual, expected), || {
        format!("{what}: expected {expected:?}, got {actual:?}")
    })
}

pub(crate) fn expect_absent(what: &str, actual: Option<&Bson>) -> CaseResult {
    expect_value(what, actual, None)
}

/// Same `_id` and comparator-equal content.
pub(crate) fn expect_same_document(actual: &Document, expected: &Document) -> CaseResult {
    ensure_eq("_id", document_id(actual), document_id(expected))?;
    ensure(documents_equal(actual, expected), || {
        format!("documents differ: expected {expected}, got {actual}")
    })
}

/// Every field of `expected` is present in `actual` with an equal value.
pub(crate) fn expect_contains_fields(actual: &Bson, expected: &Bson) -> CaseResult {
    let (Bson::Document(actual), Bson::Document(expected)) = (actual, expected) else {
        return expect_value("element", Some(actual), Some(expected));
    };
    for (key, value) in expected {
        expect_value(key, actual.get(key), Some(value))?;
    }
    Ok(())
}

pub(crate) fn expect_version(doc: &Document, expected: i64) -> CaseResult {
    ensure_eq("_obj_ver", object_version(doc), Some(expected))
}

pub(crate) fn expect_error<T: Debug>(result: Result<T, DbError>, message: &str) -> CaseResult {
    match result {
        Ok(value) => Err(CaseFailure::Assertion(format!(
            "expected error \"{message}\", call succeeded with {value:?}"
        ))),
        Err(e) => ensure_eq("error message", e.to_string().as_str(), message),
    }
}

/// The array at `field` of a stored document.
pub(crate) fn array<'a>(doc: &'a Document, field: &str) -> Result<&'a Vec<Bson>, CaseFailure> {
    match doc.get(field) {
        Some(Bson::Array(items)) => Ok(items),
        other => Err(CaseFailure::Assertion(format!(
            "field {field}: expected an array, got {other:?}"
        ))),
    }
}

/// First element of the array at `field` of a factory document.
pub(crate) fn first_element<'a>(doc: &'a Document, field: &str) -> Result<&'a Bson, CaseFailure> {
    match doc.get(field) {
        Some(Bson::Array(items)) => items
            .first()
            .ok_or_else(|| setup(format!("factory array {field} is empty"))),
        _ => Err(setup(format!("factory document has no array {field}"))),
    }
}

/// `get_value` for an element that must be an object.
pub(crate) fn element_value<'a>(element: &'a Bson, path: &str) -> Option<&'a Bson> {
    match element {
        Bson::Document(doc) => get_value(doc, path),
        _ => None,
    }
}

/// A value distinct from `value`: numbers gain one, strings gain a `1` suffix.
pub(crate) fn derived_value(value: &Bson) -> Result<Bson, CaseFailure> {
    match value {
        Bson::String(s) => Ok(Bson::String(format!("{s}1"))),
        Bson::Int32(v) => Ok(Bson::Int32(v.wrapping_add(1))),
        Bson::Int64(v) => Ok(Bson::Int64(v.wrapping_add(1))),
        Bson::Double(v) => Ok(Bson::Double(v + 1.0)),
        other => Err(setup(format!("cannot derive a new value from {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{bson, doc};

    #[test]
    fn derived_values_differ() {
        assert_eq!(derived_value(&bson!("a")).unwrap(), bson!("a1"));
        assert_eq!(derived_value(&bson!(1)).unwrap(), bson!(2));
        assert!(derived_value(&bson!([1])).is_err());
    }

    #[test]
    fn contains_fields_ignores_extras() {
        let actual = bson!({ "a": 1, "b": "x", "_id": "e1" });
        assert!(expect_contains_fields(&actual, &bson!({ "a": 1 })).is_ok());
        assert!(expect_contains_fields(&actual, &bson!({ "a": 2 })).is_err());
    }

    #[test]
    fn error_expectations() {
        let err: Result<(), DbError> = Err(DbError::validation("boom"));
        assert!(expect_error(err.clone(), "boom").is_ok());
        assert!(expect_error(err, "bang").is_err());
        assert!(expect_error(Ok::<_, DbError>(1), "boom").is_err());
    }

    #[test]
    fn same_document_checks_id() {
        let a = doc! { "_id": "x", "n": 1 };
        let b = doc! { "_id": "y", "n": 1 };
        assert!(expect_same_document(&a, &a.clone()).is_ok());
        assert!(expect_same_document(&a, &b).is_err());
    }
}

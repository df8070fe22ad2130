//! Equality that survives a trip through a backend.
//!
//! Backends assign `_id`, drop `null` fields and coerce empty arrays on write,
//! and may widen or narrow integers when marshalling. Assertions about stored
//! documents compare with [`deep_equal_marshalled`] so none of that counts as a
//! difference, while any real change of content still does.

use bson::{Bson, Document};

use crate::ID_FIELD;

/// `null` and zero-length arrays count as absent.
fn normalize(value: Option<&Bson>) -> Option<&Bson> {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => None,
        Some(Bson::Array(items)) if items.is_empty() => None,
        Some(value) => Some(value),
    }
}

fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        _ => None,
    }
}

/// Integers of either width compare exactly. A double equals an integer only
/// when it holds that integer's value with no fraction and no rounding.
fn numbers_equal(lhs: &Bson, rhs: &Bson) -> Option<bool> {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    match (lhs, rhs) {
        (Bson::Double(a), Bson::Double(b)) => Some(a == b),
        (Bson::Double(d), other) | (other, Bson::Double(d)) => {
            let i = as_integer(other)?;
            let integral = d.fract() == 0.0 && *d >= -I64_BOUND && *d < I64_BOUND;
            Some(integral && *d as i64 == i)
        }
        _ => Some(as_integer(lhs)? == as_integer(rhs)?),
    }
}

pub fn deep_equal_marshalled(lhs: Option<&Bson>, rhs: Option<&Bson>) -> bool {
    let (lhs, rhs) = match (normalize(lhs), normalize(rhs)) {
        (None, None) => return true,
        (Some(l), Some(r)) => (l, r),
        _ => return false,
    };

    match (lhs, rhs) {
        (Bson::Array(l), Bson::Array(r)) => {
            l.len() == r.len()
                && l
                    .iter()
                    .zip(r)
                    .all(|(a, b)| deep_equal_marshalled(Some(a), Some(b)))
        }
        (Bson::DateTime(l), Bson::DateTime(r)) => l.timestamp_millis() == r.timestamp_millis(),
        (Bson::Document(l), Bson::Document(r)) => documents_equal(l, r),
        (l, r) => numbers_equal(l, r).unwrap_or_else(|| l == r),
    }
}

/// Compare two documents over the union of their keys, ignoring `_id`.
pub fn documents_equal(lhs: &Document, rhs: &Document) -> bool {
    lhs.keys()
        .chain(rhs.keys())
        .filter(|key| key.as_str() != ID_FIELD)
        .all(|key| deep_equal_marshalled(lhs.get(key), rhs.get(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{DateTime, doc};

    fn eq(lhs: impl Into<Bson>, rhs: impl Into<Bson>) -> bool {
        deep_equal_marshalled(Some(&lhs.into()), Some(&rhs.into()))
    }

    #[test]
    fn null_equivalents_are_equal() {
        assert!(deep_equal_marshalled(None, None));
        assert!(deep_equal_marshalled(Some(&Bson::Null), Some(&Bson::Null)));
        assert!(deep_equal_marshalled(Some(&Bson::Null), None));
        assert!(deep_equal_marshalled(None, Some(&Bson::Null)));
    }

    #[test]
    fn null_and_value_differ() {
        assert!(!deep_equal_marshalled(Some(&Bson::Null), Some(&Bson::Int32(0))));
        assert!(!deep_equal_marshalled(Some(&Bson::Int32(0)), Some(&Bson::Null)));
        assert!(!deep_equal_marshalled(None, Some(&Bson::Int32(0))));
        assert!(!deep_equal_marshalled(Some(&Bson::Int32(0)), None));
    }

    #[test]
    fn empty_array_is_absent() {
        assert!(deep_equal_marshalled(Some(&Bson::Array(vec![])), None));
        assert!(documents_equal(&doc! { "tags": [] }, &doc! {}));
    }

    #[test]
    fn equal_arrays() {
        assert!(eq(bson::bson!([1, "b", 3]), bson::bson!([1, "b", 3])));
    }

    #[test]
    fn unequal_arrays() {
        assert!(!eq(bson::bson!([1, "b", 3]), bson::bson!([1, "b", 3, 4])));
        assert!(!eq(bson::bson!([1, "b", 3]), bson::bson!([1, "b", 3.01])));
        assert!(!eq(bson::bson!([1, "b", 3]), bson::bson!([3, "b", 1])));
    }

    #[test]
    fn key_order_is_irrelevant() {
        assert!(documents_equal(&doc! { "a": 1, "b": 2 }, &doc! { "b": 2, "a": 1 }));
    }

    #[test]
    fn unequal_documents() {
        assert!(!documents_equal(&doc! { "a": 1, "b": 2 }, &doc! { "a": 1, "b": 3 }));
        assert!(!documents_equal(&doc! { "a": 1, "b": 2 }, &doc! { "a": 1, "c": 2 }));
    }

    #[test]
    fn id_is_ignored() {
        assert!(documents_equal(
            &doc! { "_id": "x", "a": 1 },
            &doc! { "_id": "y", "a": 1 }
        ));
        assert!(documents_equal(&doc! { "a": 1 }, &doc! { "_id": "y", "a": 1 }));
    }

    #[test]
    fn user_id_field_is_compared() {
        assert!(!documents_equal(&doc! { "id": 1 }, &doc! { "id": 2 }));
    }

    #[test]
    fn nested_null_matches_missing() {
        assert!(documents_equal(
            &doc! { "a": { "b": Bson::Null, "c": 1 } },
            &doc! { "a": { "c": 1 } }
        ));
    }

    #[test]
    fn dates_compare_by_instant() {
        let base = 1_000_000_000_000;
        assert!(eq(DateTime::from_millis(base), DateTime::from_millis(base)));
        assert!(!eq(DateTime::from_millis(base), DateTime::from_millis(base + 2000)));
    }

    #[test]
    fn numbers_compare_across_widths() {
        assert!(eq(Bson::Int32(1), Bson::Int64(1)));
        assert!(eq(Bson::Int64(2), Bson::Double(2.0)));
        assert!(!eq(Bson::Int32(1), Bson::String("1".into())));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let big = 9_007_199_254_740_992_i64;
        assert!(!eq(Bson::Int64(big + 1), Bson::Int64(big)));
        assert!(eq(Bson::Int64(big + 1), Bson::Int64(big + 1)));
        assert!(eq(Bson::Int32(7), Bson::Int64(7)));
        assert!(!eq(Bson::Int64(big + 1), Bson::Double(big as f64)));
        assert!(eq(Bson::Int64(big), Bson::Double(big as f64)));
        assert!(!eq(Bson::Int64(i64::MAX), Bson::Double(i64::MAX as f64)));
    }

    #[test]
    fn integer_never_equals_fractional_double() {
        assert!(!eq(Bson::Int32(2), Bson::Double(2.5)));
        assert!(!eq(Bson::Double(2.5), Bson::Int64(2)));
        assert!(!eq(Bson::Double(f64::NAN), Bson::Double(f64::NAN)));
    }
}

use std::cmp::Ordering;

use bson::{Bson, Document};
use docdb_db::{DbError, document_id};
use docdb_query::{FieldPath, Sort};

/// Total order over values of mixed type: absent and null first, then numbers,
/// strings, documents, arrays, booleans, dates, everything else.
pub fn compare_values(lhs: Option<&Bson>, rhs: Option<&Bson>) -> Ordering {
    let (l, r) = match (lhs, rhs) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(l), Some(r)) => (l, r),
    };
    match rank(l).cmp(&rank(r)) {
        Ordering::Equal => {}
        other => return other,
    }
    match (l, r) {
        (Bson::String(a), Bson::String(b)) => a.cmp(b),
        (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
        (Bson::DateTime(a), Bson::DateTime(b)) => a.timestamp_millis().cmp(&b.timestamp_millis()),
        (Bson::Array(a), Bson::Array(b)) => a
            .iter()
            .zip(b)
            .map(|(x, y)| compare_values(Some(x), Some(y)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Bson::Document(a), Bson::Document(b)) => a
            .iter()
            .zip(b.iter())
            .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_values(Some(va), Some(vb))))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Bson::Null | Bson::Undefined, Bson::Null | Bson::Undefined) => Ordering::Equal,
        (Bson::Double(a), Bson::Double(b)) => compare_doubles(*a, *b),
        (Bson::Double(d), other) => integer(other).map_or(Ordering::Equal, |i| {
            compare_integer_to_double(i, *d).reverse()
        }),
        (other, Bson::Double(d)) => {
            integer(other).map_or(Ordering::Equal, |i| compare_integer_to_double(i, *d))
        }
        _ => match (integer(l), integer(r)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => l.to_string().cmp(&r.to_string()),
        },
    }
}

/// Variants that share a rank are ordered by value; the rest fall back to
/// their display form within a single variant.
fn rank(value: &Bson) -> u8 {
    match value {
        Bson::Null | Bson::Undefined => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 1,
        Bson::Decimal128(_) => 2,
        Bson::String(_) => 3,
        Bson::Symbol(_) => 4,
        Bson::Document(_) => 5,
        Bson::Array(_) => 6,
        Bson::Boolean(_) => 7,
        Bson::DateTime(_) => 8,
        Bson::Timestamp(_) => 9,
        Bson::ObjectId(_) => 10,
        Bson::Binary(_) => 11,
        Bson::RegularExpression(_) => 12,
        Bson::JavaScriptCode(_) => 13,
        Bson::JavaScriptCodeWithScope(_) => 14,
        Bson::DbPointer(_) => 15,
        Bson::MinKey => 16,
        Bson::MaxKey => 17,
    }
}

fn integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        _ => None,
    }
}

/// NaN sorts below every other number.
fn compare_doubles(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison, with no rounding of the integer through `f64`.
fn compare_integer_to_double(i: i64, d: f64) -> Ordering {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    if d.is_nan() {
        return Ordering::Greater;
    }
    if d >= I64_BOUND {
        return Ordering::Less;
    }
    if d < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = d.trunc();
    i.cmp(&(whole as i64)).then_with(|| {
        let fraction = d - whole;
        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

struct SortKey {
    path: FieldPath,
    descending: bool,
}

fn parse_sort(sort: &Sort) -> Result<Vec<SortKey>, DbError> {
    sort.iter()
        .map(|(field, direction)| {
            let descending = match direction {
                Bson::Int32(1) | Bson::Int64(1) => false,
                Bson::Int32(-1) | Bson::Int64(-1) => true,
                Bson::Double(d) if *d == 1.0 => false,
                Bson::Double(d) if *d == -1.0 => true,
                _ => {
                    return Err(DbError::validation(format!(
                        "sort direction for {field} must be 1 or -1"
                    )));
                }
            };
            Ok(SortKey {
                path: FieldPath::parse(field)?,
                descending,
            })
        })
        .collect()
}

/// Order documents by `sort`, falling back to `_id` so equal keys keep a
/// stable relative order between calls.
pub fn sort_documents(docs: &mut [Document], sort: Option<&Sort>) -> Result<(), DbError> {
    let keys = match sort {
        Some(sort) => parse_sort(sort)?,
        None => Vec::new(),
    };
    docs.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let o = compare_values(key.path.resolve(a), key.path.resolve(b));
                if key.descending { o.reverse() } else { o }
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| document_id(a).cmp(&document_id(b)))
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn ids(docs: &[Document]) -> Vec<String> {
        docs.iter().filter_map(document_id).collect()
    }

    #[test]
    fn default_order_is_by_id() {
        let mut docs = vec![doc! { "_id": "b" }, doc! { "_id": "c" }, doc! { "_id": "a" }];
        sort_documents(&mut docs, None).unwrap();
        assert_eq!(ids(&docs), ["a", "b", "c"]);
    }

    #[test]
    fn ascending_and_descending() {
        let mut docs = vec![
            doc! { "_id": "a", "n": 2 },
            doc! { "_id": "b", "n": 1 },
            doc! { "_id": "c", "n": 3 },
        ];
        sort_documents(&mut docs, Some(&doc! { "n": 1 })).unwrap();
        assert_eq!(ids(&docs), ["b", "a", "c"]);
        sort_documents(&mut docs, Some(&doc! { "n": -1 })).unwrap();
        assert_eq!(ids(&docs), ["c", "a", "b"]);
    }

    #[test]
    fn missing_values_sort_first() {
        let mut docs = vec![doc! { "_id": "a", "n": 1 }, doc! { "_id": "b" }];
        sort_documents(&mut docs, Some(&doc! { "n": 1 })).unwrap();
        assert_eq!(ids(&docs), ["b", "a"]);
    }

    #[test]
    fn ties_fall_back_to_id() {
        let mut docs = vec![
            doc! { "_id": "b", "n": 1 },
            doc! { "_id": "a", "n": 1 },
        ];
        sort_documents(&mut docs, Some(&doc! { "n": 1 })).unwrap();
        assert_eq!(ids(&docs), ["a", "b"]);
    }

    #[test]
    fn invalid_direction() {
        let mut docs = vec![doc! { "_id": "a" }];
        assert!(sort_documents(&mut docs, Some(&doc! { "n": 2 })).is_err());
    }

    #[test]
    fn numbers_before_strings() {
        assert_eq!(
            compare_values(Some(&Bson::Int32(5)), Some(&Bson::String("a".into()))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&Bson::Int64(2)), Some(&Bson::Double(1.5))),
            Ordering::Greater
        );
    }

    #[test]
    fn nan_keys_sort_without_panicking() {
        let mut docs: Vec<Document> = (0..200)
            .map(|i| {
                let n = if i % 3 == 0 { f64::NAN } else { f64::from(200 - i) };
                doc! { "_id": format!("{i:03}"), "n": n }
            })
            .collect();
        sort_documents(&mut docs, Some(&doc! { "n": 1 })).unwrap();

        let keys: Vec<f64> = docs.iter().map(|d| d.get_f64("n").unwrap()).collect();
        let nans = keys.iter().take_while(|n| n.is_nan()).count();
        assert_eq!(nans, 67);
        assert!(keys[nans..].windows(2).all(|w| w[0] <= w[1]));

        sort_documents(&mut docs, Some(&doc! { "n": -1 })).unwrap();
        assert!(docs.last().unwrap().get_f64("n").unwrap().is_nan());
    }

    #[test]
    fn large_integers_order_exactly() {
        let big = 9_007_199_254_740_992_i64;
        assert_eq!(
            compare_values(Some(&Bson::Int64(big + 1)), Some(&Bson::Int64(big))),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(Some(&Bson::Int64(big + 1)), Some(&Bson::Double(big as f64))),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(Some(&Bson::Double(big as f64)), Some(&Bson::Int64(big))),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(Some(&Bson::Int64(i64::MAX)), Some(&Bson::Double(i64::MAX as f64))),
            Ordering::Less
        );
    }

    #[test]
    fn integers_against_fractional_doubles() {
        assert_eq!(
            compare_values(Some(&Bson::Int32(2)), Some(&Bson::Double(2.5))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&Bson::Int32(-2)), Some(&Bson::Double(-2.5))),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(Some(&Bson::Double(f64::NAN)), Some(&Bson::Int32(i32::MIN))),
            Ordering::Less
        );
    }

    #[test]
    fn decimals_sort_apart_from_other_numbers() {
        let decimal = Bson::Decimal128(bson::Decimal128::from_bytes([0; 16]));
        assert_eq!(compare_values(Some(&Bson::Int32(5)), Some(&decimal)), Ordering::Less);
        assert_eq!(compare_values(Some(&decimal), Some(&Bson::Double(0.5))), Ordering::Greater);
        assert_eq!(
            compare_values(Some(&decimal), Some(&Bson::String("a".into()))),
            Ordering::Less
        );
        assert_eq!(compare_values(Some(&decimal), Some(&decimal.clone())), Ordering::Equal);
    }
}

use bson::{Bson, Document};
use docdb_db::{DbError, document_id};
use docdb_query::{FieldPath, ID_FIELD, deep_equal_marshalled};

/// Whether `doc` satisfies every equality in `conditions`.
///
/// Keys are dotted paths. A path crossing an array matches when any element
/// matches, so `{ "parts.part_id": "p1" }` selects documents with a `p1` part
/// and `{ "tags": "red" }` selects documents tagged `red`. Operator documents
/// (`{ "$gt": .. }`) are not understood by this store and are rejected.
pub fn matches(doc: &Document, conditions: &Document) -> Result<bool, DbError> {
    for (key, expected) in conditions {
        if let Bson::Document(inner) = expected {
            if let Some(op) = inner.keys().find(|k| k.starts_with('$')) {
                return Err(DbError::validation(format!(
                    "condition operator {op} is not supported"
                )));
            }
        }

        if key.as_str() == ID_FIELD {
            let wanted = match expected {
                Bson::String(s) => s.clone(),
                Bson::ObjectId(oid) => oid.to_hex(),
                _ => return Ok(false),
            };
            if document_id(doc).as_deref() != Some(wanted.as_str()) {
                return Ok(false);
            }
            continue;
        }

        let path = FieldPath::parse(key)?;
        let mut candidates = Vec::new();
        collect_from(doc, path.segments(), &mut candidates);
        let hit = candidates
            .iter()
            .any(|value| value_matches(value, expected));
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

fn value_matches(value: &Bson, expected: &Bson) -> bool {
    if deep_equal_marshalled(Some(value), Some(expected)) {
        return true;
    }
    match value {
        Bson::Array(items) => items
            .iter()
            .any(|item| deep_equal_marshalled(Some(item), Some(expected))),
        _ => false,
    }
}

fn collect_from<'a>(doc: &'a Document, segments: &[String], out: &mut Vec<&'a Bson>) {
    if let Some((first, rest)) = segments.split_first() {
        if let Some(value) = doc.get(first) {
            collect(value, rest, out);
        }
    }
}

/// Gather every value reachable at `segments`, fanning out across arrays.
fn collect<'a>(value: &'a Bson, segments: &[String], out: &mut Vec<&'a Bson>) {
    let Some((first, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };
    match value {
        Bson::Document(doc) => collect_from(doc, segments, out),
        Bson::Array(items) => {
            if let Ok(index) = first.parse::<usize>() {
                if let Some(next) = items.get(index) {
                    collect(next, rest, out);
                }
            }
            for item in items {
                if let Bson::Document(_) = item {
                    collect(item, segments, out);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn sample() -> Document {
        doc! {
            "_id": "6523a1f0c2b1d4e5f6a7b8c9",
            "name": "widget",
            "qty": 3,
            "tags": ["red", "blue"],
            "parts": [ { "part_id": "p1" }, { "part_id": "p2" } ],
            "dims": { "width": 4 }
        }
    }

    #[test]
    fn empty_conditions_match_everything() {
        assert!(matches(&sample(), &doc! {}).unwrap());
    }

    #[test]
    fn top_level_equality() {
        assert!(matches(&sample(), &doc! { "name": "widget" }).unwrap());
        assert!(!matches(&sample(), &doc! { "name": "gadget" }).unwrap());
    }

    #[test]
    fn numeric_equality_across_widths() {
        assert!(matches(&sample(), &doc! { "qty": 3_i64 }).unwrap());
    }

    #[test]
    fn id_condition() {
        assert!(matches(&sample(), &doc! { "_id": "6523a1f0c2b1d4e5f6a7b8c9" }).unwrap());
        assert!(!matches(&sample(), &doc! { "_id": "ffffffffffffffffffffffff" }).unwrap());
    }

    #[test]
    fn array_contains() {
        assert!(matches(&sample(), &doc! { "tags": "blue" }).unwrap());
        assert!(!matches(&sample(), &doc! { "tags": "green" }).unwrap());
    }

    #[test]
    fn path_through_object_array() {
        assert!(matches(&sample(), &doc! { "parts.part_id": "p2" }).unwrap());
        assert!(!matches(&sample(), &doc! { "parts.part_id": "p3" }).unwrap());
    }

    #[test]
    fn nested_path() {
        assert!(matches(&sample(), &doc! { "dims.width": 4 }).unwrap());
    }

    #[test]
    fn all_conditions_must_hold() {
        assert!(!matches(&sample(), &doc! { "name": "widget", "qty": 4 }).unwrap());
    }

    #[test]
    fn operators_are_rejected() {
        assert!(matches(&sample(), &doc! { "qty": { "$gt": 1 } }).is_err());
    }
}

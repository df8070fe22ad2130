use bson::{Bson, Document};
use docdb_query::{ID_FIELD, VERSION_FIELD};

/// The `_id` of a stored document as a string, whatever its BSON type.
pub fn document_id(doc: &Document) -> Option<String> {
    match doc.get(ID_FIELD)? {
        Bson::String(s) => Some(s.clone()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::Null => None,
        other => Some(other.to_string()),
    }
}

/// The `_obj_ver` of a document, tolerant of integer width.
pub fn object_version(doc: &Document) -> Option<i64> {
    match doc.get(VERSION_FIELD)? {
        Bson::Int32(v) => Some(*v as i64),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use bson::{Bson, Document, doc};
use docdb_conformance::{Field, FieldKind, ObjArray, StringArray, TestFields, random_value};

static SERIAL: AtomicU64 = AtomicU64::new(0);

fn next_serial() -> String {
    format!("s-{}", SERIAL.fetch_add(1, Ordering::Relaxed))
}

pub fn part() -> Bson {
    bson::bson!({
        "part_id": next_serial(),
        "qty": random_value(FieldKind::Number),
    })
}

pub fn widget() -> Document {
    doc! {
        "title": random_value(FieldKind::String),
        "serial": next_serial(),
        "tags": [random_value(FieldKind::String)],
        "parts": [part()],
    }
}

pub fn widget_fields() -> TestFields {
    TestFields {
        populated_string: Some("title".into()),
        unpopulated_string: Some("note".into()),
        unique_key_fieldname: Some("serial".into()),
        string_array: Some(StringArray {
            name: "tags".into(),
        }),
        obj_array: Some(
            ObjArray::new("parts", Field::new("qty", FieldKind::Number), part)
                .key_field("part_id")
                .unpopulated_field(Field::new("color", FieldKind::String)),
        ),
    }
}

/// Cases in the full suite.
pub const TOTAL_CASES: usize = 37;

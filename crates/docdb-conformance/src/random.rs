use bson::Bson;
use rand::Rng;

use crate::fields::FieldKind;

/// A fresh value of the given kind. Strings are the decimal text of a random
/// number in `[0, 1)`.
pub fn random_value(kind: FieldKind) -> Bson {
    let value: f64 = rand::thread_rng().gen_range(0.0..1.0);
    match kind {
        FieldKind::Number => Bson::Double(value),
        FieldKind::String => Bson::String(value.to_string()),
    }
}

use bson::{Bson, Document};
use docdb_query::{FieldPath, UNSET_ARRAY_WITHOUT_SUBFIELD, deep_equal_marshalled, get_value};

use crate::error::DbError;

/// How an array element is located: by its own value, or by the value of a key
/// field inside an object element.
pub(crate) struct Selector<'a> {
    key_field: Option<&'a str>,
    element_id: &'a Bson,
}

impl<'a> Selector<'a> {
    pub(crate) fn new(key_field: Option<&'a str>, element_id: &'a Bson) -> Self {
        Self {
            key_field,
            element_id,
        }
    }

    fn matches(&self, element: &Bson) -> bool {
        match (self.key_field, element) {
            (Some(key), Bson::Document(doc)) => {
                deep_equal_marshalled(get_value(doc, key), Some(self.element_id))
            }
            (Some(_), _) => false,
            (None, value) => deep_equal_marshalled(Some(value), Some(self.element_id)),
        }
    }

    fn describe(&self, path: &FieldPath) -> String {
        match self.key_field {
            Some(key) => format!(
                "no element with {key}={} in array field={path}",
                self.element_id
            ),
            None => format!("element_id={} not found in array field={path}", self.element_id),
        }
    }
}

/// `set` on a field: create or overwrite.
pub(crate) fn op_set(doc: &mut Document, path: &FieldPath, value: &Bson) -> Result<(), DbError> {
    if let Some((parent, leaf)) = path.parent_mut(doc, true)? {
        parent.insert(leaf, value.clone());
    }
    Ok(())
}

/// `unset` on a field: remove if present. Arrays must be emptied with `remove`.
pub(crate) fn op_unset(doc: &mut Document, path: &FieldPath) -> Result<(), DbError> {
    if let Some((parent, leaf)) = path.parent_mut(doc, false)? {
        if let Some(Bson::Array(_)) = parent.get(leaf) {
            return Err(DbError::validation(UNSET_ARRAY_WITHOUT_SUBFIELD));
        }
        parent.remove(leaf);
    }
    Ok(())
}

/// `insert`: append to an array, creating it when absent.
pub(crate) fn op_insert(doc: &mut Document, path: &FieldPath, value: &Bson) -> Result<(), DbError> {
    let Some((parent, leaf)) = path.parent_mut(doc, true)? else {
        return Ok(());
    };
    match parent.get_mut(leaf) {
        Some(Bson::Array(items)) => {
            items.push(value.clone());
            return Ok(());
        }
        None | Some(Bson::Null) => {}
        Some(_) => {
            return Err(DbError::validation(format!(
                "cmd=insert: field={path} is not an array"
            )));
        }
    }
    parent.insert(leaf, Bson::Array(vec![value.clone()]));
    Ok(())
}

/// `set` without a subfield on a located element: replace it whole.
pub(crate) fn op_replace_element(
    doc: &mut Document,
    path: &FieldPath,
    selector: &Selector<'_>,
    value: &Bson,
) -> Result<(), DbError> {
    let element = locate_mut(doc, path, selector)?;
    *element = value.clone();
    Ok(())
}

/// `set` with a subfield: write only that path inside the located element.
pub(crate) fn op_set_in_element(
    doc: &mut Document,
    path: &FieldPath,
    selector: &Selector<'_>,
    subfield: &FieldPath,
    value: &Bson,
) -> Result<(), DbError> {
    let element = element_document(locate_mut(doc, path, selector)?, path)?;
    if let Some((parent, leaf)) = subfield.parent_mut(element, true)? {
        parent.insert(leaf, value.clone());
    }
    Ok(())
}

/// `unset` with a subfield: drop that path inside the located element.
pub(crate) fn op_unset_in_element(
    doc: &mut Document,
    path: &FieldPath,
    selector: &Selector<'_>,
    subfield: &FieldPath,
) -> Result<(), DbError> {
    let element = element_document(locate_mut(doc, path, selector)?, path)?;
    if let Some((parent, leaf)) = subfield.parent_mut(element, false)? {
        parent.remove(leaf);
    }
    Ok(())
}

/// `remove`: delete the located element.
pub(crate) fn op_remove_element(
    doc: &mut Document,
    path: &FieldPath,
    selector: &Selector<'_>,
) -> Result<(), DbError> {
    let items = array_mut(doc, path)?;
    let index = items
        .iter()
        .position(|element| selector.matches(element))
        .ok_or_else(|| DbError::validation(selector.describe(path)))?;
    items.remove(index);
    Ok(())
}

// ── Internal helpers ────────────────────────────────────────────

fn array_mut<'a>(doc: &'a mut Document, path: &'a FieldPath) -> Result<&'a mut Vec<Bson>, DbError> {
    match path.get_mut(doc)? {
        Some(Bson::Array(items)) => Ok(items),
        Some(_) => Err(DbError::validation(format!("field={path} is not an array"))),
        None => Err(DbError::validation(format!("array field={path} is not present"))),
    }
}

fn locate_mut<'a>(
    doc: &'a mut Document,
    path: &'a FieldPath,
    selector: &Selector<'_>,
) -> Result<&'a mut Bson, DbError> {
    array_mut(doc, path)?
        .iter_mut()
        .find(|element| selector.matches(element))
        .ok_or_else(|| DbError::validation(selector.describe(path)))
}

fn element_document<'a>(element: &'a mut Bson, path: &FieldPath) -> Result<&'a mut Document, DbError> {
    match element {
        Bson::Document(doc) => Ok(doc),
        _ => Err(DbError::validation(format!(
            "elements of field={path} are not objects, a subfield cannot be addressed"
        ))),
    }
}

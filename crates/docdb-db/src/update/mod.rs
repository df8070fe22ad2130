//! Applying update commands to a stored document.
//!
//! A backend that keeps documents as BSON can delegate `update` to
//! [`apply_commands`]; one that translates commands into its own store's
//! operators should reproduce the same target selection:
//!
//! - no `element_id`: the command acts on `field` itself;
//! - `element_id` without `key_field`: the scalar element equal to it;
//! - `element_id` with `key_field`: the object element whose `key_field` equals it;
//! - `subfield` narrows `set`/`unset` to a path inside the selected element.

mod ops;

use bson::{Bson, Document};
use docdb_query::{FieldPath, UpdateCmd, UpdateFieldCommand, VERSION_FIELD};

use crate::document::object_version;
use crate::error::DbError;

/// Apply `commands` in order, all or nothing.
///
/// Commands run against a working copy; `doc` is only replaced once every
/// command has succeeded. `_obj_ver` is not touched, see [`bump_version`].
pub fn apply_commands(doc: &mut Document, commands: &[UpdateFieldCommand]) -> Result<(), DbError> {
    if commands.is_empty() {
        return Err(DbError::validation("updates must contain at least one command"));
    }

    let mut working = doc.clone();
    for command in commands {
        apply_command(&mut working, command)?;
    }
    *doc = working;
    Ok(())
}

/// Apply a single command in place. On error `doc` may be partially modified.
pub fn apply_command(doc: &mut Document, command: &UpdateFieldCommand) -> Result<(), DbError> {
    command.validate()?;
    let path = FieldPath::parse(&command.field)?;

    match (command.cmd, &command.element_id) {
        (UpdateCmd::Set, None) => ops::op_set(doc, &path, required_value(command)?),
        (UpdateCmd::Unset, None) => ops::op_unset(doc, &path),
        (UpdateCmd::Insert, _) => ops::op_insert(doc, &path, required_value(command)?),
        (UpdateCmd::Set, Some(element_id)) => {
            let selector = ops::Selector::new(command.key_field.as_deref(), element_id);
            match &command.subfield {
                Some(subfield) => ops::op_set_in_element(
                    doc,
                    &path,
                    &selector,
                    &FieldPath::parse(subfield)?,
                    required_value(command)?,
                ),
                None => ops::op_replace_element(doc, &path, &selector, required_value(command)?),
            }
        }
        (UpdateCmd::Unset, Some(element_id)) => {
            let selector = ops::Selector::new(command.key_field.as_deref(), element_id);
            match &command.subfield {
                Some(subfield) => {
                    ops::op_unset_in_element(doc, &path, &selector, &FieldPath::parse(subfield)?)
                }
                None => Err(DbError::validation(docdb_query::UNSET_ARRAY_WITHOUT_SUBFIELD)),
            }
        }
        (UpdateCmd::Remove, Some(element_id)) => {
            let selector = ops::Selector::new(command.key_field.as_deref(), element_id);
            ops::op_remove_element(doc, &path, &selector)
        }
        (UpdateCmd::Remove, None) => Err(DbError::validation("cmd=remove requires element_id")),
    }
}

fn required_value(command: &UpdateFieldCommand) -> Result<&Bson, DbError> {
    command
        .value
        .as_ref()
        .ok_or_else(|| DbError::validation(format!("cmd={} requires a value", command.cmd)))
}

/// Set `_obj_ver` to one more than its current value and return it.
///
/// A document without a version is treated as version 0.
pub fn bump_version(doc: &mut Document) -> i64 {
    let next = object_version(doc).unwrap_or(0) + 1;
    doc.insert(VERSION_FIELD, Bson::Int64(next));
    next
}

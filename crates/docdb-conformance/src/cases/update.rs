//! Partial updates. Each case creates a factory document, applies one command
//! addressed by `_id` and `_obj_ver`, and inspects the returned document.

use bson::Bson;
use docdb_db::{SupportedFeatures, UNSET_ARRAY_WITHOUT_SUBFIELD};
use docdb_query::UpdateFieldCommand;
use futures::FutureExt;

use crate::check::{
    array, derived_value, element_value, ensure_eq, expect_absent, expect_contains_fields,
    expect_error, expect_value, expect_version, first_element,
};
use crate::context::Context;
use crate::failure::{CaseFailure, CaseResult, ensure};
use crate::fields::{FieldKind, TestFields};
use crate::gate::Gate;
use crate::random::random_value;
use crate::suite::{Case, Group};

pub(crate) fn groups(fields: &TestFields, features: &SupportedFeatures) -> Vec<Group> {
    let object = features.update.object;
    let arrays = features.update.array;
    let populated = fields.populated_string.is_some();
    let unpopulated = fields.unpopulated_string.is_some();
    let strings = fields.string_array.is_some();
    let objects = fields.obj_array.is_some();
    let keyed = fields.obj_array_key().is_some();
    let new_subfield = fields
        .obj_array
        .as_ref()
        .is_some_and(|a| a.unpopulated_field.is_some());

    vec![
        Group::new(
            "update, path without an array, cmd=set",
            vec![
                Case::new(
                    "should replace an existing field in an object",
                    Gate::requires([populated, object.set]),
                    |ctx| set_existing_field(ctx).boxed(),
                ),
                Case::new(
                    "should create a non-existant field in an object",
                    Gate::requires([unpopulated, object.set]),
                    |ctx| set_new_field(ctx).boxed(),
                ),
                Case::new(
                    "should update the object version",
                    Gate::requires([unpopulated, object.set]),
                    |ctx| set_advances_version(ctx).boxed(),
                ),
            ],
        ),
        Group::new(
            "update, path without an array, cmd=unset",
            vec![Case::new(
                "should remove an existing field in an object",
                Gate::requires([populated, object.unset]),
                |ctx| unset_field(ctx).boxed(),
            )],
        ),
        Group::new(
            "update, path with an array, cmd=set",
            vec![
                Case::new(
                    "should replace an existing element in an array of simple types",
                    Gate::requires([strings, arrays.set]),
                    |ctx| set_scalar_element(ctx).boxed(),
                ),
                Case::new(
                    "should replace an existing element in an array of objects",
                    Gate::requires([objects, keyed, arrays.set]),
                    |ctx| set_object_element(ctx).boxed(),
                ),
                Case::new(
                    "should create a new field in an existing element in an array of objects",
                    Gate::requires([objects, keyed, new_subfield, arrays.set]),
                    |ctx| set_new_subfield(ctx).boxed(),
                ),
                Case::new(
                    "should replace an existing field in an existing element in an array of objects",
                    Gate::requires([objects, keyed, arrays.set]),
                    |ctx| set_existing_subfield(ctx).boxed(),
                ),
            ],
        ),
        Group::new(
            "update, path with an array, cmd=unset",
            vec![
                Case::new(
                    "should remove an existing field from an existing element in the array",
                    Gate::requires([objects, keyed, arrays.unset]),
                    |ctx| unset_subfield(ctx).boxed(),
                ),
                Case::new(
                    "should not remove or delete an existing element of an array of simple types",
                    Gate::requires([strings, arrays.unset]),
                    |ctx| unset_scalar_element_fails(ctx).boxed(),
                ),
                Case::new(
                    "should not remove or delete an existing element of an array of objects",
                    Gate::requires([objects, keyed, arrays.unset]),
                    |ctx| unset_object_element_fails(ctx).boxed(),
                ),
            ],
        ),
        Group::new(
            "update, path with an array, cmd=insert",
            vec![
                Case::new(
                    "should create a new element in an array of simple types",
                    Gate::requires([strings, arrays.insert]),
                    |ctx| insert_scalar(ctx).boxed(),
                ),
                Case::new(
                    "should create a new element in an array of objects",
                    Gate::requires([objects, keyed, arrays.insert]),
                    |ctx| insert_object(ctx).boxed(),
                ),
            ],
        ),
        Group::new(
            "update, path with an array, cmd=remove",
            vec![
                Case::new(
                    "should remove an existing element from an array of simple types",
                    Gate::requires([strings, arrays.remove]),
                    |ctx| remove_scalar(ctx).boxed(),
                ),
                Case::new(
                    "should remove an existing element from an array of objects",
                    Gate::requires([objects, keyed, arrays.remove]),
                    |ctx| remove_object(ctx).boxed(),
                ),
            ],
        ),
    ]
}

/// Key of an object element, read through the array's key field.
fn element_key(element: &Bson, key_field: &str) -> Result<Bson, CaseFailure> {
    element_value(element, key_field)
        .cloned()
        .ok_or_else(|| CaseFailure::Setup(format!("factory element has no {key_field}")))
}

// ── Object fields ───────────────────────────────────────────────

async fn set_existing_field(ctx: &Context) -> CaseResult {
    let field = ctx.populated_string()?;
    let obj = ctx.new_document();
    let current = obj
        .get(field)
        .ok_or_else(|| CaseFailure::Setup(format!("factory document has no {field}")))?;
    let replacement = derived_value(current)?;
    let cmd = UpdateFieldCommand::set(field, replacement.clone());
    let u = ctx.create_then_update(&obj, cmd).await?;
    expect_value(field, u.updated.get(field), Some(&replacement))
}

async fn set_new_field(ctx: &Context) -> CaseResult {
    let field = ctx.unpopulated_string()?;
    let obj = ctx.new_document();
    ensure(!obj.contains_key(field), || {
        format!("factory document already has {field}")
    })?;
    let u = ctx
        .create_then_update(&obj, UpdateFieldCommand::set(field, "abc"))
        .await?;
    expect_value(field, u.updated.get(field), Some(&Bson::from("abc")))
}

async fn set_advances_version(ctx: &Context) -> CaseResult {
    let field = ctx.unpopulated_string()?;
    let u = ctx
        .create_then_update(&ctx.new_document(), UpdateFieldCommand::set(field, "abc"))
        .await?;
    expect_version(&u.created, 1)?;
    expect_version(&u.updated, 2)
}

async fn unset_field(ctx: &Context) -> CaseResult {
    let field = ctx.populated_string()?;
    let u = ctx
        .create_then_update(&ctx.new_document(), UpdateFieldCommand::unset(field))
        .await?;
    expect_absent(field, u.updated.get(field))
}

// ── Array elements: set ─────────────────────────────────────────

async fn set_scalar_element(ctx: &Context) -> CaseResult {
    let name = &ctx.string_array()?.name;
    let obj = ctx.new_document();
    let original = first_element(&obj, name)?.clone();
    let replacement = derived_value(&original)?;
    let cmd = UpdateFieldCommand::set(name.as_str(), replacement.clone()).element(original);
    let u = ctx.create_then_update(&obj, cmd).await?;
    let items = array(&u.updated, name)?;
    ensure_eq("array length", items.len(), 1)?;
    expect_value("array[0]", items.first(), Some(&replacement))
}

async fn set_object_element(ctx: &Context) -> CaseResult {
    let (spec, key) = ctx.keyed_obj_array()?;
    let obj = ctx.new_document();
    let element_id = element_key(first_element(&obj, &spec.name)?, key)?;
    let replacement = (spec.create_element)();
    let cmd = UpdateFieldCommand::set(spec.name.as_str(), replacement.clone())
        .keyed_element(key, element_id);
    let u = ctx.create_then_update(&obj, cmd).await?;
    let items = array(&u.updated, &spec.name)?;
    ensure_eq("array length", items.len(), 1)?;
    expect_value("array[0]", items.first(), Some(&replacement))
}

async fn set_new_subfield(ctx: &Context) -> CaseResult {
    let (spec, key) = ctx.keyed_obj_array()?;
    let subfield = spec
        .unpopulated_field
        .as_ref()
        .ok_or_else(|| CaseFailure::Setup("obj_array.unpopulated_field is not set".into()))?;
    let obj = ctx.new_document();
    let element_id = element_key(first_element(&obj, &spec.name)?, key)?;
    let value = random_value(subfield.kind);
    let cmd = UpdateFieldCommand::set(spec.name.as_str(), value.clone())
        .keyed_element(key, element_id)
        .subfield(subfield.name.as_str());
    let u = ctx.create_then_update(&obj, cmd).await?;
    let first = array(&u.updated, &spec.name)?.first();
    let actual = first.and_then(|e| element_value(e, &subfield.name));
    expect_value(&subfield.name, actual, Some(&value))
}

async fn set_existing_subfield(ctx: &Context) -> CaseResult {
    let (spec, key) = ctx.keyed_obj_array()?;
    let subfield = &spec.populated_field.name;
    let obj = ctx.new_document();
    let element_id = element_key(first_element(&obj, &spec.name)?, key)?;
    let donor = ctx.new_document();
    let value = element_value(first_element(&donor, &spec.name)?, subfield)
        .cloned()
        .ok_or_else(|| CaseFailure::Setup(format!("factory element has no {subfield}")))?;
    let cmd = UpdateFieldCommand::set(spec.name.as_str(), value.clone())
        .keyed_element(key, element_id)
        .subfield(subfield.as_str());
    let u = ctx.create_then_update(&obj, cmd).await?;
    let first = array(&u.updated, &spec.name)?.first();
    let actual = first.and_then(|e| element_value(e, subfield));
    expect_value(subfield, actual, Some(&value))
}

// ── Array elements: unset ───────────────────────────────────────

async fn unset_subfield(ctx: &Context) -> CaseResult {
    let (spec, key) = ctx.keyed_obj_array()?;
    let subfield = &spec.populated_field.name;
    let obj = ctx.new_document();
    let element_id = element_key(first_element(&obj, &spec.name)?, key)?;
    let cmd = UpdateFieldCommand::unset(spec.name.as_str())
        .keyed_element(key, element_id)
        .subfield(subfield.as_str());
    let u = ctx.create_then_update(&obj, cmd).await?;
    let first = array(&u.updated, &spec.name)?
        .first()
        .ok_or_else(|| CaseFailure::Assertion("element was removed".into()))?;
    expect_absent(subfield, element_value(first, subfield))
}

async fn unset_scalar_element_fails(ctx: &Context) -> CaseResult {
    let name = &ctx.string_array()?.name;
    let obj = ctx.new_document();
    let original = first_element(&obj, name)?.clone();
    let (created, _) = ctx.create(&obj).await?;
    let cmd = UpdateFieldCommand::unset(name.as_str()).element(original);
    expect_error(ctx.try_update(&created, cmd).await, UNSET_ARRAY_WITHOUT_SUBFIELD)
}

async fn unset_object_element_fails(ctx: &Context) -> CaseResult {
    let (spec, key) = ctx.keyed_obj_array()?;
    let obj = ctx.new_document();
    let element_id = element_key(first_element(&obj, &spec.name)?, key)?;
    let (created, _) = ctx.create(&obj).await?;
    let cmd = UpdateFieldCommand::unset(spec.name.as_str()).keyed_element(key, element_id);
    expect_error(ctx.try_update(&created, cmd).await, UNSET_ARRAY_WITHOUT_SUBFIELD)
}

// ── Array elements: insert ──────────────────────────────────────

async fn insert_scalar(ctx: &Context) -> CaseResult {
    let name = &ctx.string_array()?.name;
    let mut obj = ctx.new_document();
    let original = random_value(FieldKind::String);
    obj.insert(name.as_str(), vec![original.clone()]);
    let added = random_value(FieldKind::String);
    let cmd = UpdateFieldCommand::insert(name.as_str(), added.clone());
    let u = ctx.create_then_update(&obj, cmd).await?;
    let items = array(&u.updated, name)?;
    ensure_eq("array length", items.len(), 2)?;
    expect_value("array[0]", items.first(), Some(&original))?;
    expect_value("array[1]", items.get(1), Some(&added))
}

async fn insert_object(ctx: &Context) -> CaseResult {
    let spec = ctx.obj_array()?;
    let obj = ctx.new_document();
    let original = first_element(&obj, &spec.name)?.clone();
    let added = (spec.create_element)();
    let cmd = UpdateFieldCommand::insert(spec.name.as_str(), added.clone());
    let u = ctx.create_then_update(&obj, cmd).await?;
    let items = array(&u.updated, &spec.name)?;
    ensure_eq("array length", items.len(), 2)?;
    expect_contains_fields(&items[0], &original)?;
    expect_contains_fields(&items[1], &added)
}

// ── Array elements: remove ──────────────────────────────────────

async fn remove_scalar(ctx: &Context) -> CaseResult {
    let name = &ctx.string_array()?.name;
    let obj = ctx.new_document();
    let original = first_element(&obj, name)?.clone();
    let u = ctx
        .create_then_update(&obj, UpdateFieldCommand::remove(name.as_str()).element(original))
        .await?;
    ensure_eq("array length", array(&u.updated, name)?.len(), 0)
}

async fn remove_object(ctx: &Context) -> CaseResult {
    let (spec, key) = ctx.keyed_obj_array()?;
    let obj = ctx.new_document();
    let element_id = element_key(first_element(&obj, &spec.name)?, key)?;
    let cmd = UpdateFieldCommand::remove(spec.name.as_str()).keyed_element(key, element_id);
    let u = ctx.create_then_update(&obj, cmd).await?;
    ensure_eq("array length", array(&u.updated, &spec.name)?.len(), 0)
}

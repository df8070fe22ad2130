use docdb_db::{ID_NOT_ALLOWED_FOR_CREATE, object_version};
use docdb_query::ID_FIELD;
use futures::FutureExt;

use crate::check::{ensure_eq, expect_error, expect_value, expect_version};
use crate::context::Context;
use crate::failure::{CaseResult, ensure};
use crate::fields::TestFields;
use crate::gate::Gate;
use crate::suite::{Case, Group};

pub(crate) fn groups(fields: &TestFields) -> Vec<Group> {
    vec![Group::new(
        "create",
        vec![
            Case::new(
                "should create a new object",
                Gate::requires([fields.populated_string.is_some()]),
                |ctx| creates_new_object(ctx).boxed(),
            ),
            Case::new(
                "should not modify the original object",
                Gate::always(),
                |ctx| leaves_input_untouched(ctx).boxed(),
            ),
            Case::new(
                "should return an error if the object to be created contains an _id",
                Gate::always(),
                |ctx| rejects_preset_id(ctx).boxed(),
            ),
            Case::new(
                "should create a new object, containing an object version of 1",
                Gate::always(),
                |ctx| starts_at_version_one(ctx).boxed(),
            ),
        ],
    )]
}

async fn creates_new_object(ctx: &Context) -> CaseResult {
    let field = ctx.populated_string()?;
    let obj = ctx.new_document();
    let (created, _) = ctx.create(&obj).await?;
    ensure(created != obj, || "created document equals its input".into())?;
    expect_value(field, created.get(field), obj.get(field))
}

async fn leaves_input_untouched(ctx: &Context) -> CaseResult {
    let obj = ctx.new_document();
    let before = obj.clone();
    ctx.create(&obj).await?;
    ensure(!obj.contains_key(ID_FIELD), || "input gained an _id".into())?;
    ensure_eq("input", &obj, &before)
}

async fn rejects_preset_id(ctx: &Context) -> CaseResult {
    let mut obj = ctx.new_document();
    obj.insert(ID_FIELD, "123456789012345678901234");
    expect_error(ctx.db().create(&obj).await, ID_NOT_ALLOWED_FOR_CREATE)
}

async fn starts_at_version_one(ctx: &Context) -> CaseResult {
    let (created, _) = ctx.create(&ctx.new_document()).await?;
    ensure(object_version(&created).is_some(), || "created document has no _obj_ver".into())?;
    expect_version(&created, 1)
}

use docdb_db::ID_INVALID;
use futures::FutureExt;

use crate::check::{ensure_eq, expect_error};
use crate::context::Context;
use crate::failure::CaseResult;
use crate::gate::Gate;
use crate::suite::{Case, Group};

pub(crate) fn groups() -> Vec<Group> {
    vec![Group::new(
        "delete",
        vec![
            Case::new(
                "should not be able to read after delete",
                Gate::always(),
                |ctx| unreadable_after_delete(ctx).boxed(),
            ),
            Case::new(
                "should return an error when the request is missing the _id",
                Gate::always(),
                |ctx| missing_id_fails(ctx).boxed(),
            ),
            Case::new(
                "should not return an error when the _id doesnt reference an object",
                Gate::always(),
                |ctx| absent_is_ok(ctx).boxed(),
            ),
        ],
    )]
}

async fn unreadable_after_delete(ctx: &Context) -> CaseResult {
    let (_, id) = ctx.create(&ctx.new_document()).await?;
    ctx.db().delete(&id).await?;
    let read = ctx.db().read(&id).await?;
    ensure_eq("read after delete", read, None)
}

async fn missing_id_fails(ctx: &Context) -> CaseResult {
    expect_error(ctx.db().delete("").await, ID_INVALID)
}

async fn absent_is_ok(ctx: &Context) -> CaseResult {
    ctx.create(&ctx.new_document()).await?;
    ctx.db().delete("123456789012345678901234").await?;
    Ok(())
}

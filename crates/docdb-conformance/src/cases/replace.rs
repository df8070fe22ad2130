use bson::Document;
use docdb_db::SupportedFeatures;
use futures::FutureExt;

use crate::check::{derived_value, expect_value, expect_version};
use crate::context::Context;
use crate::failure::{CaseFailure, CaseResult, ensure};
use crate::fields::TestFields;
use crate::gate::Gate;
use crate::suite::{Case, Group};

pub(crate) fn groups(fields: &TestFields, features: &SupportedFeatures) -> Vec<Group> {
    let gate = || Gate::requires([features.replace, fields.populated_string.is_some()]);
    vec![Group::new(
        "replace",
        vec![
            Case::new("should replace an existing object", gate(), |ctx| {
                replaces_existing(ctx).boxed()
            }),
            Case::new("should update the object version", gate(), |ctx| {
                advances_version(ctx).boxed()
            }),
        ],
    )]
}

struct Replaced {
    created: Document,
    submitted: Document,
    replaced: Document,
}

/// Create a document, change its populated field and replace it.
async fn replace(ctx: &Context) -> Result<Replaced, CaseFailure> {
    let field = ctx.populated_string()?;
    let (created, _) = ctx.create(&ctx.new_document()).await?;
    let mut submitted = created.clone();
    let current = created
        .get(field)
        .ok_or_else(|| CaseFailure::Setup(format!("factory document has no {field}")))?;
    submitted.insert(field, derived_value(current)?);
    let replaced = ctx.db().replace(&submitted).await?;
    expect_value(field, replaced.get(field), submitted.get(field))?;
    Ok(Replaced {
        created,
        submitted,
        replaced,
    })
}

async fn replaces_existing(ctx: &Context) -> CaseResult {
    let field = ctx.populated_string()?;
    let r = replace(ctx).await?;
    expect_value(field, r.replaced.get(field), r.submitted.get(field))?;
    ensure(r.replaced.get(field) != r.created.get(field), || {
        format!("{field} still holds its created value")
    })
}

async fn advances_version(ctx: &Context) -> CaseResult {
    let r = replace(ctx).await?;
    expect_version(&r.created, 1)?;
    expect_version(&r.replaced, 2)
}

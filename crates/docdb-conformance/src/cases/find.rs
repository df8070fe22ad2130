use bson::Document;
use docdb_db::SupportedFeatures;
use docdb_query::{Cursor, FindQuery};
use futures::FutureExt;

use crate::check::{ensure_eq, expect_same_document, expect_value};
use crate::context::Context;
use crate::failure::{CaseFailure, CaseResult, setup};
use crate::fields::TestFields;
use crate::gate::Gate;
use crate::suite::{Case, Group};

/// Documents created ahead of the cursor cases.
const SEEDED: usize = 20;

pub(crate) fn groups(fields: &TestFields, features: &SupportedFeatures) -> Vec<Group> {
    let gate = || Gate::requires([features.find.all]);
    vec![
        Group::new(
            "find",
            vec![Case::new(
                "should find an object with a matching unique field",
                Gate::requires([fields.unique_key_fieldname.is_some()]),
                |ctx| finds_by_unique_key(ctx).boxed(),
            )],
        ),
        Group::new(
            "find cursor",
            vec![
                Case::new(
                    "should return the first item when start_offset = 0",
                    gate(),
                    |ctx| offset_zero_has_first(ctx).boxed(),
                ),
                Case::new("should default start_offset to 0", gate(), |ctx| {
                    offset_defaults_to_zero(ctx).boxed()
                }),
                Case::new(
                    "should return the tenth item when start_offset = 9",
                    gate(),
                    |ctx| offset_nine_is_tenth(ctx).boxed(),
                ),
                Case::new("should return one item if count = 1", gate(), |ctx| {
                    count_one(ctx).boxed()
                }),
                Case::new("should default count to 10", gate(), |ctx| {
                    count_defaults_to_ten(ctx).boxed()
                }),
                Case::new("should return 11 items if count = 11", gate(), |ctx| {
                    count_eleven(ctx).boxed()
                }),
            ],
        )
        .before(|ctx| seed(ctx).boxed()),
    ]
}

async fn seed(ctx: &Context) -> CaseResult {
    for _ in 0..SEEDED {
        ctx.create(&ctx.new_document()).await?;
    }
    Ok(())
}

async fn find_all(ctx: &Context, cursor: Option<Cursor>) -> Result<Vec<Document>, CaseFailure> {
    let mut query = FindQuery::new();
    if let Some(cursor) = cursor {
        query = query.cursor(cursor);
    }
    Ok(ctx.db().find(&query).await?)
}

async fn finds_by_unique_key(ctx: &Context) -> CaseResult {
    let key = ctx.unique_key()?;
    let obj = ctx.new_document();
    let value = obj
        .get(key)
        .cloned()
        .ok_or_else(|| setup(format!("factory document has no {key}")))?;
    ctx.create(&obj).await?;
    let mut conditions = Document::new();
    conditions.insert(key, value.clone());
    let found = ctx.db().find(&FindQuery::new().conditions(conditions)).await?;
    ensure_eq("documents found", found.len(), 1)?;
    expect_value(key, found[0].get(key), Some(&value))
}

async fn offset_zero_has_first(ctx: &Context) -> CaseResult {
    let found = find_all(ctx, Some(Cursor::offset(0))).await?;
    ensure_eq("has a first document", found.first().is_some(), true)
}

async fn offset_defaults_to_zero(ctx: &Context) -> CaseResult {
    let from_zero = find_all(ctx, Some(Cursor::offset(0))).await?;
    let first = from_zero
        .first()
        .ok_or_else(|| CaseFailure::Assertion("start_offset=0 returned nothing".into()))?;
    let defaulted = find_all(ctx, None).await?;
    let default_first = defaulted
        .first()
        .ok_or_else(|| CaseFailure::Assertion("default cursor returned nothing".into()))?;
    expect_same_document(default_first, first)
}

async fn offset_nine_is_tenth(ctx: &Context) -> CaseResult {
    let first_ten = find_all(ctx, Some(Cursor::new(0, 10))).await?;
    let tenth = first_ten
        .get(9)
        .ok_or_else(|| CaseFailure::Assertion(format!("only {} documents", first_ten.len())))?;
    let from_nine = find_all(ctx, Some(Cursor::offset(9))).await?;
    let first = from_nine
        .first()
        .ok_or_else(|| CaseFailure::Assertion("start_offset=9 returned nothing".into()))?;
    expect_same_document(first, tenth)
}

async fn count_one(ctx: &Context) -> CaseResult {
    let found = find_all(ctx, Some(Cursor::count(1))).await?;
    ensure_eq("documents found", found.len(), 1)
}

async fn count_defaults_to_ten(ctx: &Context) -> CaseResult {
    let found = find_all(ctx, None).await?;
    ensure_eq("documents found", found.len(), 10)
}

async fn count_eleven(ctx: &Context) -> CaseResult {
    let found = find_all(ctx, Some(Cursor::count(11))).await?;
    ensure_eq("documents found", found.len(), 11)
}

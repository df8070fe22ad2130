use docdb_db::{ID_OR_IDS_INVALID, document_id};
use futures::FutureExt;

use crate::check::{ensure_eq, expect_error, expect_same_document, expect_value};
use crate::context::Context;
use crate::failure::{CaseFailure, CaseResult};
use crate::fields::TestFields;
use crate::gate::Gate;
use crate::suite::{Case, Group};

const BATCH: usize = 2;

pub(crate) fn groups(fields: &TestFields) -> Vec<Group> {
    let populated = fields.populated_string.is_some();
    vec![
        Group::new(
            "read an object specified by a single string ID",
            vec![
                Case::new(
                    "should read a previously created object",
                    Gate::requires([populated]),
                    |ctx| reads_created(ctx).boxed(),
                ),
                Case::new(
                    "should return no result for a non-existant object",
                    Gate::always(),
                    |ctx| absent_is_empty(ctx).boxed(),
                ),
                Case::new(
                    "should return an error when the request is missing the _id",
                    Gate::always(),
                    |ctx| missing_id_fails(ctx).boxed(),
                ),
            ],
        ),
        Group::new(
            "read an array of objects specified by an array of string IDs",
            vec![
                Case::new(
                    "should read a set of previously created objects",
                    Gate::requires([populated]),
                    |ctx| reads_batch(ctx).boxed(),
                ),
                Case::new(
                    "should not add anything to the results for an ID that doesnt reference a document",
                    Gate::requires([populated]),
                    |ctx| batch_skips_absent(ctx).boxed(),
                ),
                Case::new(
                    "should return an empty array if none of the IDs reference a document",
                    Gate::always(),
                    |ctx| batch_all_absent(ctx).boxed(),
                ),
            ],
        ),
    ]
}

async fn reads_created(ctx: &Context) -> CaseResult {
    let field = ctx.populated_string()?;
    let obj = ctx.new_document();
    let (created, id) = ctx.create(&obj).await?;
    let read = ctx
        .db()
        .read(&id)
        .await?
        .ok_or_else(|| CaseFailure::Assertion(format!("no document for _id {id}")))?;
    expect_same_document(&read, &created)?;
    expect_value(field, read.get(field), obj.get(field))
}

async fn absent_is_empty(ctx: &Context) -> CaseResult {
    let read = ctx.db().read("ffffffffffffffffffffffff").await?;
    ensure_eq("read of absent _id", read, None)
}

async fn missing_id_fails(ctx: &Context) -> CaseResult {
    expect_error(ctx.db().read("").await, ID_OR_IDS_INVALID)
}

async fn create_batch(ctx: &Context) -> Result<Vec<bson::Document>, CaseFailure> {
    let mut created = Vec::with_capacity(BATCH);
    for _ in 0..BATCH {
        created.push(ctx.create(&ctx.new_document()).await?.0);
    }
    Ok(created)
}

/// Each created document appears in `read` exactly as created.
fn expect_batch(read: &[bson::Document], created: &[bson::Document], field: &str) -> CaseResult {
    ensure_eq("documents read", read.len(), created.len())?;
    for expected in created {
        let id = document_id(expected);
        let found = read
            .iter()
            .find(|doc| document_id(doc) == id)
            .ok_or_else(|| CaseFailure::Assertion(format!("_id {id:?} missing from results")))?;
        expect_same_document(found, expected)?;
        expect_value(field, found.get(field), expected.get(field))?;
    }
    Ok(())
}

async fn reads_batch(ctx: &Context) -> CaseResult {
    let field = ctx.populated_string()?;
    let created = create_batch(ctx).await?;
    let ids: Vec<String> = created.iter().filter_map(document_id).collect();
    let read = ctx.db().read_many(&ids).await?;
    expect_batch(&read, &created, field)
}

async fn batch_skips_absent(ctx: &Context) -> CaseResult {
    let field = ctx.populated_string()?;
    let created = create_batch(ctx).await?;
    let mut ids: Vec<String> = created.iter().filter_map(document_id).collect();
    ids.insert(1, "123456789012345678901234".to_string());
    ensure_eq("requested ids", ids.len(), BATCH + 1)?;
    let read = ctx.db().read_many(&ids).await?;
    expect_batch(&read, &created, field)
}

async fn batch_all_absent(ctx: &Context) -> CaseResult {
    let ids = vec![
        "123456789012345678901234".to_string(),
        "123456789012345678901235".to_string(),
    ];
    let read = ctx.db().read_many(&ids).await?;
    ensure_eq("documents read", read.len(), 0)
}

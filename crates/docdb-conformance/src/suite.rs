use docdb_db::SupportedFeatures;
use futures::future::BoxFuture;

use crate::cases;
use crate::context::Context;
use crate::failure::CaseResult;
use crate::fields::TestFields;
use crate::gate::Gate;

pub(crate) type CaseFn = for<'a> fn(&'a Context) -> BoxFuture<'a, CaseResult>;

pub(crate) struct Case {
    pub name: &'static str,
    pub gate: Gate,
    pub run: CaseFn,
}

impl Case {
    pub fn new(name: &'static str, gate: Gate, run: CaseFn) -> Self {
        Self { name, gate, run }
    }
}

/// Cases sharing a heading and an optional `before` hook, which runs once
/// ahead of the first case when at least one case of the group runs.
pub(crate) struct Group {
    pub name: &'static str,
    pub before: Option<CaseFn>,
    pub cases: Vec<Case>,
}

impl Group {
    pub fn new(name: &'static str, cases: Vec<Case>) -> Self {
        Self {
            name,
            before: None,
            cases,
        }
    }

    pub fn before(mut self, hook: CaseFn) -> Self {
        self.before = Some(hook);
        self
    }
}

/// Every group of the suite in execution order, gates already evaluated
/// against `fields` and `features`.
pub(crate) fn build(fields: &TestFields, features: &SupportedFeatures) -> Vec<Group> {
    let mut groups = Vec::new();
    groups.extend(cases::create::groups(fields));
    groups.extend(cases::read::groups(fields));
    groups.extend(cases::replace::groups(fields, features));
    groups.extend(cases::update::groups(fields, features));
    groups.extend(cases::delete::groups());
    groups.extend(cases::find::groups(fields, features));
    groups
}

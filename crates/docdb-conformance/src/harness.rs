use std::fmt;
use std::sync::Arc;

use bson::Document;
use docdb_db::{DocumentDatabase, SupportedFeatures};

use crate::context::Context;
use crate::fields::TestFields;
use crate::gate::Decision;
use crate::suite::{self, Group};

/// Runs the conformance suite against one database.
pub struct Harness {
    ctx: Context,
    groups: Vec<Group>,
}

/// Run/skip decision of one case, fixed when the suite is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCase {
    pub group: &'static str,
    pub name: &'static str,
    pub decision: Decision,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub cases: Vec<PlannedCase>,
}

impl Plan {
    pub fn runnable(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.decision == Decision::Run)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.cases.len() - self.runnable()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub group: &'static str,
    pub name: &'static str,
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| *o == CaseOutcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == CaseOutcome::Skipped)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome, CaseOutcome::Failed(_)))
    }

    /// No case failed. Skipped cases do not count against a backend.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome_of(&self, name: &str) -> Option<&CaseOutcome> {
        self.cases.iter().find(|c| c.name == name).map(|c| &c.outcome)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )?;
        for case in self.failures() {
            if let CaseOutcome::Failed(msg) = &case.outcome {
                write!(f, "\n  {} / {}: {msg}", case.group, case.name)?;
            }
        }
        Ok(())
    }
}

impl Harness {
    pub fn new(
        db: Arc<dyn DocumentDatabase>,
        factory: impl Fn() -> Document + Send + Sync + 'static,
        fields: TestFields,
        features: SupportedFeatures,
    ) -> Self {
        let groups = suite::build(&fields, &features);
        Self {
            ctx: Context::new(db, Arc::new(factory), fields, features),
            groups,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The run/skip decision of every case, in execution order.
    pub fn build(&self) -> Plan {
        let cases = self
            .groups
            .iter()
            .flat_map(|group| {
                group.cases.iter().map(|case| PlannedCase {
                    group: group.name,
                    name: case.name,
                    decision: case.gate.decide(),
                })
            })
            .collect();
        Plan { cases }
    }

    /// Run every runnable case in order. Cases run one at a time against the
    /// shared database; each creates the documents it inspects.
    pub async fn run(&self) -> SuiteReport {
        let mut report = SuiteReport::default();

        for group in &self.groups {
            let runnable = group
                .cases
                .iter()
                .any(|case| case.gate.decide() == Decision::Run);

            let mut before_failure = None;
            if runnable {
                if let Some(hook) = group.before {
                    if let Err(e) = hook(&self.ctx).await {
                        tracing::warn!(group = group.name, error = %e, "before hook failed");
                        before_failure = Some(format!("before hook failed: {e}"));
                    }
                }
            }

            for case in &group.cases {
                let outcome = match (case.gate.decide(), &before_failure) {
                    (Decision::Skip, _) => {
                        tracing::debug!(group = group.name, case = case.name, "skipped");
                        CaseOutcome::Skipped
                    }
                    (Decision::Run, Some(msg)) => CaseOutcome::Failed(msg.clone()),
                    (Decision::Run, None) => match (case.run)(&self.ctx).await {
                        Ok(()) => {
                            tracing::debug!(group = group.name, case = case.name, "passed");
                            CaseOutcome::Passed
                        }
                        Err(e) => {
                            tracing::warn!(group = group.name, case = case.name, error = %e, "failed");
                            CaseOutcome::Failed(e.to_string())
                        }
                    },
                };
                report.cases.push(CaseReport {
                    group: group.name,
                    name: case.name,
                    outcome,
                });
            }
        }

        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "conformance suite finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &'static str, outcome: CaseOutcome) -> CaseReport {
        CaseReport {
            group: "g",
            name,
            outcome,
        }
    }

    #[test]
    fn report_counts() {
        let report = SuiteReport {
            cases: vec![
                case("a", CaseOutcome::Passed),
                case("b", CaseOutcome::Skipped),
                case("c", CaseOutcome::Failed("boom".into())),
            ],
        };
        assert_eq!(report.passed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.outcome_of("b"), Some(&CaseOutcome::Skipped));
        assert_eq!(
            report.to_string(),
            "1 passed, 1 failed, 1 skipped\n  g / c: boom"
        );
    }

    #[test]
    fn skips_alone_are_success() {
        let report = SuiteReport {
            cases: vec![case("a", CaseOutcome::Skipped)],
        };
        assert!(report.is_success());
    }
}

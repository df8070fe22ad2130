//! Backend-agnostic conformance suite for `DocumentDatabase` implementations.
//!
//! A backend supplies a document factory, a `TestFields` description of which
//! schema fields play which role, and its `SupportedFeatures`. Every case
//! declares what it needs; cases whose needs are not met are reported as
//! skipped, never as failed.

mod cases;
mod check;
mod context;
mod failure;
mod fields;
mod gate;
mod harness;
mod random;
mod suite;

pub use context::Context;
pub use failure::CaseFailure;
pub use fields::{DocumentFactory, ElementFactory, Field, FieldKind, ObjArray, StringArray, TestFields};
pub use gate::{Decision, Gate};
pub use harness::{CaseOutcome, CaseReport, Harness, Plan, PlannedCase, SuiteReport};
pub use random::random_value;

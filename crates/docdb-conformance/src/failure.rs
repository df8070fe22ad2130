use docdb_db::DbError;

/// Why a case did not pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaseFailure {
    #[error("{0}")]
    Assertion(String),

    #[error("unexpected error: {0}")]
    Db(#[from] DbError),

    /// The factory or field roles do not fit what the case needs.
    #[error("test setup: {0}")]
    Setup(String),
}

pub type CaseResult = Result<(), CaseFailure>;

pub(crate) fn ensure(condition: bool, msg: impl FnOnce() -> String) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(CaseFailure::Assertion(msg()))
    }
}

pub(crate) fn setup(msg: impl Into<String>) -> CaseFailure {
    CaseFailure::Setup(msg.into())
}

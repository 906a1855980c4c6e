// Error handling for the attesta runtime

pub type TestResult<T> = Result<T, TestError>;

/// Errors surfaced while registering or executing tests.
///
/// Assertion, hook, and test-body failures are caught at the per-test
/// boundary inside the scheduler; module failures at the per-module
/// boundary inside the runner. Nothing propagates past a top-level run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TestError {
    /// A matcher outcome did not match the expected (possibly negated)
    /// result. Carries the fully formatted human-readable message.
    #[error("{0}")]
    Assertion(String),

    #[error("Unknown matcher: {0}")]
    UnknownMatcher(String),

    #[error("Arity mismatch in {matcher}: expected {expected}, got {actual}")]
    MatcherArity {
        matcher: String,
        expected: String,
        actual: usize,
    },

    /// A named test module was not found in the runner's registry.
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// `it`/`before_each`/`after_each` called outside a registering suite.
    #[error("No suite is currently registering")]
    NoActiveSuite,

    /// A second suite began registering while one was already current.
    #[error("Suite '{0}' is still registering")]
    SuiteActive(String),

    /// A test body or hook panicked; carries the panic payload text.
    #[error("Panicked: {0}")]
    Panicked(String),

    /// Generic failure raised by user test code.
    #[error("{0}")]
    Failure(String),
}

impl TestError {
    pub fn failure(message: impl Into<String>) -> TestError {
        TestError::Failure(message.into())
    }
}

//! Suite registration and sequential test execution.
//!
//! A `Harness` is the explicit test-run context: the matcher registry,
//! the run tally, the single current-suite slot, and the report sink are
//! shared state behind one cloneable handle instead of ambient globals.
//! Execution is strictly sequential; a suspended test holds the run
//! until it resolves, and nothing ever runs interleaved.

use std::any::Any;
use std::cell::RefCell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::{TestError, TestResult};
use crate::expectation::Expectation;
use crate::matchers::{Matcher, MatcherRegistry};
use crate::report::{ConsoleSink, ReportSink};
use crate::values::Value;

pub type TestFuture = LocalBoxFuture<'static, TestResult<()>>;
type TestFn = Rc<dyn Fn(Value) -> TestFuture>;
type BeforeHook = Rc<dyn Fn() -> TestResult<Value>>;
type AfterHook = Rc<dyn Fn(&Value) -> TestResult<()>>;

/// Aggregate pass/fail/skip counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub skipped_suites: usize,
    pub skipped_tests: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SuiteState {
    Registering,
    Running,
}

struct TestCase {
    name: String,
    body: TestFn,
}

/// A named grouping of queued tests sharing one pair of hooks.
struct Suite {
    name: String,
    state: SuiteState,
    queue: Vec<TestCase>,
    before_each: Option<BeforeHook>,
    after_each: Option<AfterHook>,
}

impl Suite {
    fn new(name: &str) -> Suite {
        Suite {
            name: name.to_string(),
            state: SuiteState::Registering,
            queue: Vec::new(),
            before_each: None,
            after_each: None,
        }
    }
}

/// The test-run context. Clones share registry, tally, current-suite
/// slot, and sink.
#[derive(Clone)]
pub struct Harness {
    registry: Rc<RefCell<MatcherRegistry>>,
    tally: Rc<RefCell<Tally>>,
    current: Rc<RefCell<Option<Suite>>>,
    sink: Rc<dyn ReportSink>,
}

impl Harness {
    /// A harness reporting to stdout.
    pub fn new() -> Harness {
        Harness::with_sink(Rc::new(ConsoleSink))
    }

    pub fn with_sink(sink: Rc<dyn ReportSink>) -> Harness {
        Harness {
            registry: Rc::new(RefCell::new(MatcherRegistry::with_builtins())),
            tally: Rc::new(RefCell::new(Tally::default())),
            current: Rc::new(RefCell::new(None)),
            sink,
        }
    }

    /// Register and drain one suite: run the async `body` to completion
    /// (it may suspend before all tests are queued), then execute the
    /// queued tests one at a time. A failing test never aborts the
    /// suite; each test's outcome is tallied independently.
    pub async fn describe<F, Fut>(&self, name: &str, body: F) -> TestResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TestResult<()>>,
    {
        {
            let mut current = self.current.borrow_mut();
            if let Some(open) = current.as_ref() {
                return Err(TestError::SuiteActive(open.name.clone()));
            }
            *current = Some(Suite::new(name));
        }

        let registration = AssertUnwindSafe(body()).catch_unwind().await;
        let outcome = match registration {
            Ok(result) => result,
            Err(payload) => Err(TestError::Panicked(panic_text(payload))),
        };
        // The current-suite slot is held only while registering; the
        // drain below works on the owned suite.
        let suite = self.current.borrow_mut().take();
        outcome?;
        let mut suite = suite.ok_or(TestError::NoActiveSuite)?;
        suite.state = SuiteState::Running;

        self.drain(suite).await;
        Ok(())
    }

    async fn drain(&self, suite: Suite) {
        self.sink.log("");
        self.sink.log(&format!(
            "  {} [{} tests]",
            display_name(&suite.name, "{unnamed suite}"),
            suite.queue.len()
        ));

        for case in &suite.queue {
            match self
                .run_case(&suite.before_each, &suite.after_each, case)
                .await
            {
                Ok(()) => {
                    self.tally.borrow_mut().passed += 1;
                    self.sink.log(&format!(
                        "   ✅ {}.",
                        display_name(&case.name, "{unnamed test}")
                    ));
                }
                Err(error) => {
                    self.tally.borrow_mut().failed += 1;
                    self.sink.log(&format!("   ❌ {}. {}.", case.name, error));
                }
            }
        }
        log::debug!("suite '{}' drained ({} tests)", suite.name, suite.queue.len());
    }

    /// One test: `before_each` produces the state handed to the body;
    /// `after_each` runs with the same state, but only when the body
    /// succeeded. A hook failure counts exactly like a body failure.
    async fn run_case(
        &self,
        before: &Option<BeforeHook>,
        after: &Option<AfterHook>,
        case: &TestCase,
    ) -> TestResult<()> {
        let state = match before {
            Some(hook) => guard(|| hook())?,
            None => Value::Nil,
        };

        let body = AssertUnwindSafe((case.body)(state.clone())).catch_unwind();
        match body.await {
            Ok(result) => result?,
            Err(payload) => return Err(TestError::Panicked(panic_text(payload))),
        }

        if let Some(hook) = after {
            guard(|| hook(&state))?;
        }
        Ok(())
    }

    /// Queue a test in the currently registering suite. The test body
    /// receives the `before_each` state (`Nil` when no hook is set).
    pub fn it<F, Fut>(&self, name: &str, test: F) -> TestResult<()>
    where
        F: Fn(Value) -> Fut + 'static,
        Fut: Future<Output = TestResult<()>> + 'static,
    {
        let mut current = self.current.borrow_mut();
        let suite = current.as_mut().ok_or(TestError::NoActiveSuite)?;
        debug_assert_eq!(suite.state, SuiteState::Registering);
        suite.queue.push(TestCase {
            name: name.to_string(),
            body: Rc::new(move |state| test(state).boxed_local()),
        });
        Ok(())
    }

    /// Set the suite's `before_each` hook, replacing any previous one.
    /// Its return value becomes the state passed to every test.
    pub fn before_each(
        &self,
        hook: impl Fn() -> TestResult<Value> + 'static,
    ) -> TestResult<()> {
        let mut current = self.current.borrow_mut();
        let suite = current.as_mut().ok_or(TestError::NoActiveSuite)?;
        suite.before_each = Some(Rc::new(hook));
        Ok(())
    }

    /// Set the suite's `after_each` hook, replacing any previous one.
    pub fn after_each(
        &self,
        hook: impl Fn(&Value) -> TestResult<()> + 'static,
    ) -> TestResult<()> {
        let mut current = self.current.borrow_mut();
        let suite = current.as_mut().ok_or(TestError::NoActiveSuite)?;
        suite.after_each = Some(Rc::new(hook));
        Ok(())
    }

    /// Count a suite as skipped. Counter-only: nothing is prevented
    /// from also registering and running through the normal path.
    pub fn skip_suite(&self) {
        self.tally.borrow_mut().skipped_suites += 1;
    }

    /// Count a test as skipped. Counter-only, like `skip_suite`.
    pub fn skip_test(&self) {
        self.tally.borrow_mut().skipped_tests += 1;
    }

    /// Build an expectation over `subject` against the live registry.
    pub fn expect(&self, subject: impl Into<Value>) -> Expectation {
        Expectation::new(subject.into(), Rc::clone(&self.registry))
    }

    /// Merge additional matchers into the shared registry. They become
    /// available, negated form included, on every subsequent `expect`.
    pub fn extend_matchers<F>(&self, builder: F)
    where
        F: FnOnce(&MatcherRegistry) -> Vec<Matcher>,
    {
        self.registry.borrow_mut().extend(builder);
    }

    pub fn tally(&self) -> Tally {
        self.tally.borrow().clone()
    }

    pub(crate) fn reset_tally(&self) {
        *self.tally.borrow_mut() = Tally::default();
    }

    pub(crate) fn sink(&self) -> &dyn ReportSink {
        self.sink.as_ref()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Harness::new()
    }
}

fn display_name<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    if name.is_empty() {
        fallback
    } else {
        name
    }
}

/// Run a synchronous hook, converting a panic into a test failure.
fn guard<T>(f: impl FnOnce() -> TestResult<T>) -> TestResult<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(TestError::Panicked(panic_text(payload))),
    }
}

pub(crate) fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

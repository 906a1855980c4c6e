//! Top-level run entry point: named test modules executed in order.
//!
//! A test module is an async body that receives a `Harness` clone and
//! declares suites on it. Modules are independent units of failure: one
//! that is missing, errors, or panics is logged and skipped without
//! aborting the rest of the run.

use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{TestError, TestResult};
use crate::report::ReportSink;
use crate::suite::{panic_text, Harness, Tally};

pub type ModuleFn = Rc<dyn Fn(Harness) -> LocalBoxFuture<'static, TestResult<()>>>;

/// Run configuration. `path` is the base prefix prepended to each module
/// identifier when resolving it against the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    pub path: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            path: "./".to_string(),
        }
    }
}

impl RunOptions {
    pub fn with_path(path: impl Into<String>) -> RunOptions {
        RunOptions { path: path.into() }
    }
}

/// Owns the harness and the registry of named test modules.
pub struct TestRunner {
    harness: Harness,
    modules: IndexMap<String, ModuleFn>,
}

impl TestRunner {
    pub fn new() -> TestRunner {
        TestRunner::with_harness(Harness::new())
    }

    pub fn with_sink(sink: Rc<dyn ReportSink>) -> TestRunner {
        TestRunner::with_harness(Harness::with_sink(sink))
    }

    pub fn with_harness(harness: Harness) -> TestRunner {
        TestRunner {
            harness,
            modules: IndexMap::new(),
        }
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Register a module under its resolved path key (for the default
    /// options that is `./<name>`).
    pub fn register_module<F, Fut>(&mut self, key: impl Into<String>, module: F)
    where
        F: Fn(Harness) -> Fut + 'static,
        Fut: std::future::Future<Output = TestResult<()>> + 'static,
    {
        self.modules.insert(
            key.into(),
            Rc::new(move |harness| module(harness).boxed_local()),
        );
    }

    /// Execute the named modules in order and report the final tally.
    /// Counters are reset at the start of every run.
    pub async fn run(&self, names: &[&str], options: RunOptions) {
        self.harness.reset_tally();
        let sink = self.harness.sink();
        sink.log("Running tests...");

        for name in names {
            let key = format!("{}{}", options.path, name);
            if let Err(error) = self.load(&key).await {
                sink.log("");
                sink.log(&format!("Error loading test {}: {}", name, error));
            }
        }

        let tally = self.harness.tally();
        sink.log("");
        sink.log("Tests finished.");
        sink.log("");
        if tally.skipped_suites > 0 {
            sink.log(&format!("⚠️ {} suites skipped.", tally.skipped_suites));
        }
        if tally.skipped_tests > 0 {
            sink.log(&format!("⚠️ {} tests skipped.", tally.skipped_tests));
        }
        sink.log(&format!(
            "✅ {} tests passed.{}",
            tally.passed,
            if tally.failed == 0 { " 🎉" } else { "" }
        ));
        if tally.failed > 0 {
            sink.log(&format!("❌ {} tests failed.", tally.failed));
        }
    }

    async fn load(&self, key: &str) -> TestResult<()> {
        let module = self
            .modules
            .get(key)
            .cloned()
            .ok_or_else(|| TestError::ModuleNotFound(key.to_string()))?;
        log::debug!("loading test module '{}'", key);
        let body = AssertUnwindSafe(module(self.harness.clone())).catch_unwind();
        match body.await {
            Ok(result) => result,
            Err(payload) => Err(TestError::Panicked(panic_text(payload))),
        }
    }

    /// Final counters of the most recent run.
    pub fn tally(&self) -> Tally {
        self.harness.tally()
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        TestRunner::new()
    }
}

// attesta - a minimal asynchronous test-execution framework
// Suites with lifecycle hooks, an extensible matcher registry, and
// invocation-recording mock functions, executed strictly sequentially.

pub mod equality;
pub mod error;
pub mod expectation;
pub mod matchers;
pub mod mock;
pub mod report;
pub mod runner;
pub mod suite;
pub mod values;

// Re-export the key components so typical test modules need a single
// `use attesta::...` line.
pub use equality::deep_eq;
pub use error::{TestError, TestResult};
pub use expectation::Expectation;
pub use matchers::{Arity, Matcher, MatcherFn, MatcherRegistry};
pub use mock::MockFn;
pub use report::{ConsoleSink, LogSink, MemorySink, ReportSink};
pub use runner::{ModuleFn, RunOptions, TestRunner};
pub use suite::{Harness, Tally, TestFuture};
pub use values::{Function, Value};

//! The logging collaborator the framework reports through.
//!
//! Rendering is deliberately out of scope; the scheduler and runner talk
//! to a `ReportSink` with a single capability and nothing else.

use std::cell::RefCell;

/// Contract between the framework and whatever displays its report.
pub trait ReportSink {
    /// Emit one line of the textual report. May be empty.
    fn log(&self, message: &str);
}

/// Writes the report to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn log(&self, message: &str) {
        println!("{}", message);
    }
}

/// Routes the report through the `log` facade at info level.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn log(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Captures report lines in memory; used by the framework's own tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }
}

impl ReportSink for MemorySink {
    fn log(&self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }
}

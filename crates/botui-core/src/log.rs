//! Logging sink abstraction.
//!
//! No external logging crate is pulled in — matches this codebase's existing
//! convention of tagged `eprintln!` lines (see `state/persistence` in the
//! original TUI). `console.{log,warn,error}` inside scripts, and the
//! dispatcher's last-resort Critical-level swallow, both go through a
//! `LogSink` so tests can capture output instead of writing to stderr.

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Critical => "critical",
        }
    }
}

pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, scope: &str, message: &str);
}

/// Default sink: `eprintln!("[scope] level: message")`.
pub struct StderrSink;

impl LogSink for StderrSink {
    fn log(&self, level: Level, scope: &str, message: &str) {
        eprintln!("[{scope}] {}: {message}", level.tag());
    }
}

/// In-memory sink used by tests to assert on what was logged.
#[derive(Default, Clone)]
pub struct CapturingSink {
    lines: Arc<Mutex<Vec<(Level, String, String)>>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for CapturingSink {
    fn log(&self, level: Level, scope: &str, message: &str) {
        self.lines.lock().unwrap().push((level, scope.to_string(), message.to_string()));
    }
}

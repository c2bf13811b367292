//! Output sink for progress and status lines
//!
//! The engine reports progress as plain text lines through an injected
//! [`OutputSink`]; rendering (colors, tables, TTY detection) belongs to the
//! host application's console layer.

use std::sync::{Arc, Mutex};

/// Sink for the engine's structured progress/status lines
pub trait OutputSink: Send {
    /// Emit one line of output
    fn line(&mut self, text: &str);
}

/// Sink that forwards every line to `tracing` at info level
#[derive(Debug, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn line(&mut self, text: &str) {
        tracing::info!("{}", text);
    }
}

/// Sink that writes lines to stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn line(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Sink that captures lines in memory; clones share the same buffer, so a
/// caller can hand one clone to the manager and inspect the other
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines captured so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Whether any captured line contains the given needle
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl OutputSink for MemorySink {
    fn line(&mut self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

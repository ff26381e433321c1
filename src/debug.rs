//! Debug output sinks.
//!
//! A stage writes diagnostic lines to whatever sink its owner hands it. The
//! default discards everything.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

pub trait DebugSink {
    fn print(&mut self, line: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDebug;

impl DebugSink for NoopDebug {
    fn print(&mut self, _line: &str) {}
}

/// Keeps the most recent lines, oldest first.
#[derive(Debug, Clone)]
pub struct RingDebug {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RingDebug {
    pub const DEFAULT_CAPACITY: usize = 25;

    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Lines joined for an overlay.
    pub fn render(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}

impl Default for RingDebug {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl DebugSink for RingDebug {
    fn print(&mut self, line: &str) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_owned());
    }
}

/// Shared sink: the owner keeps one handle to read lines back while the
/// stage writes through the other.
impl<T: DebugSink> DebugSink for Rc<RefCell<T>> {
    fn print(&mut self, line: &str) {
        self.borrow_mut().print(line);
    }
}

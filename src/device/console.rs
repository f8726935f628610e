//! `Console`: the bounded line buffer every computer writes to.

use std::collections::VecDeque;

/// Ring buffer of console lines. When full, the oldest line is evicted.
#[derive(Debug, Clone)]
pub struct Console {
    lines: VecDeque<String>,
    limit: usize,
}

impl Console {
    /// A console holding at most `limit` lines (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Console {
            lines: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        if self.lines.len() >= self.limit {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_owned());
    }

    /// Lines currently held, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Whether any held line equals `line`.
    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl std::fmt::Display for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

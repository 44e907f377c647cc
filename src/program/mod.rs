//! Source model: the program as an ordered sequence of lines
//!
//! The stepper addresses source by 0-based line index. A [`Program`] is
//! immutable for the duration of a run; [`block`] derives multi-line
//! groupings from it on demand.

pub mod block;

/// Source text split into lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<String>,
}

impl Program {
    /// Split `text` into lines. A trailing newline does not produce an extra
    /// empty line and a `\r` before each `\n` is dropped. Never fails.
    pub fn load(text: &str) -> Self {
        Program {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at 0-based `index`, if any
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The program text, lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Lines `[start, end)` joined verbatim with `\n`
    pub fn join_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.lines.len());
        if start >= end {
            return String::new();
        }
        self.lines[start..end].join("\n")
    }
}

// Per-step snapshots of observable execution state

use crate::memory::value::Value;
use std::fmt;

/// Buffer that receives `print` output for the duration of one attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputCapture {
    buffer: String,
}

impl OutputCapture {
    pub fn new() -> Self {
        OutputCapture {
            buffer: String::new(),
        }
    }

    /// Append text verbatim
    pub fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

/// Cumulative output of a run, one entry per step that printed something
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript { lines: Vec::new() }
    }

    /// Record the output of a successful step started at 0-based `cursor`
    pub fn record(&mut self, text: &str, cursor: usize) {
        if text.is_empty() {
            return;
        }
        self.lines.push(TranscriptLine {
            text: text.to_string(),
            source_line: cursor + 1,
        });
    }

    /// Get all output as display lines
    pub fn get_output(&self) -> Vec<String> {
        self.lines
            .iter()
            .flat_map(|tl| {
                // One step may print several lines
                let mut result: Vec<String> = tl.text.split('\n').map(|s| s.to_string()).collect();
                // Remove trailing empty string if text ended with newline
                if result.last().is_some_and(|s| s.is_empty()) {
                    result.pop();
                }
                result
            })
            .collect()
    }

    /// Concatenated raw text, exactly as printed
    pub fn text(&self) -> String {
        self.lines.iter().map(|tl| tl.text.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Output of one step with the 1-based source line that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub text: String,
    pub source_line: usize,
}

/// Immutable point-in-time copy of the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvSnapshot {
    entries: Vec<(String, Value)>,
}

impl EnvSnapshot {
    /// Entries in display order
    pub fn new(entries: Vec<(String, Value)>) -> Self {
        EnvSnapshot { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Per-variable rows for the variables and memory panes
    pub fn variables(&self) -> Vec<VariableView> {
        self.entries
            .iter()
            .map(|(name, value)| VariableView {
                name: name.clone(),
                type_name: value.type_name(),
                repr: value.repr(),
                size_bytes: value.estimated_size(),
            })
            .collect()
    }

    /// Sum of the shallow sizes of every bound value
    pub fn total_size(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, value)| value.estimated_size())
            .sum()
    }
}

/// Renderer-facing description of one binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableView {
    pub name: String,
    pub type_name: &'static str,
    /// Full, untruncated representation
    pub repr: String,
    pub size_bytes: usize,
}

/// Shorten a representation to at most `limit` characters, ending in `...`
/// when anything was cut
pub fn truncate_repr(repr: &str, limit: usize) -> String {
    if repr.chars().count() <= limit {
        return repr.to_string();
    }
    let kept: String = repr.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Category of a reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    RuntimeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SyntaxError => write!(f, "Syntax Error"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
        }
    }
}

/// Failure recorded in a [`StepResult`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub kind: ErrorKind,
    /// One-line `Class: message` summary
    pub message: String,
    /// Multi-line diagnostic: source line and every attempt that was made
    pub detail: String,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Everything observable about one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Whether the cursor moved
    pub advanced: bool,
    /// Line the step started at (0-based)
    pub cursor: usize,
    /// Line the next step starts at; equals the program length on completion
    pub new_cursor: usize,
    /// Text printed during this step only
    pub output: String,
    /// Repr of a bare expression's result, when it is not `None`
    pub value: Option<String>,
    pub error: Option<StepError>,
    pub environment: EnvSnapshot,
}

impl StepResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Number of source lines covered by this step
    pub fn lines_consumed(&self) -> usize {
        self.new_cursor - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_capture() {
        let mut capture = OutputCapture::new();
        assert!(capture.is_empty());
        capture.write("a");
        capture.write("b\n");
        assert_eq!(capture.as_str(), "ab\n");
        assert_eq!(capture.into_string(), "ab\n");
    }

    #[test]
    fn test_transcript_lines() {
        let mut transcript = Transcript::new();
        transcript.record("0\n1\n", 0);
        transcript.record("", 1);
        transcript.record("done", 2);
        assert_eq!(transcript.lines.len(), 2);
        assert_eq!(transcript.lines[1].source_line, 3);
        assert_eq!(transcript.get_output(), vec!["0", "1", "done"]);
        assert_eq!(transcript.text(), "0\n1\ndone");
        transcript.clear();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_truncate_repr() {
        assert_eq!(truncate_repr("[1, 2]", 100), "[1, 2]");
        let long = "x".repeat(150);
        let shown = truncate_repr(&long, 100);
        assert_eq!(shown.chars().count(), 100);
        assert!(shown.ends_with("xxx..."));
        assert_eq!(truncate_repr("abcdef", 5), "ab...");
    }

    #[test]
    fn test_variable_views() {
        let snapshot = EnvSnapshot::new(vec![
            ("x".to_string(), Value::Int(5)),
            ("name".to_string(), Value::Str("ada".to_string())),
        ]);
        let views = snapshot.variables();
        assert_eq!(views[0].type_name, "int");
        assert_eq!(views[1].repr, "'ada'");
        assert_eq!(views[1].size_bytes, 52);
        assert_eq!(snapshot.total_size(), 28 + 52);
        assert_eq!(snapshot.names(), vec!["x", "name"]);
    }
}

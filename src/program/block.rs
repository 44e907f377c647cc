//! Block segmentation by indentation
//!
//! A block starts at a line whose stripped text ends with `:` and extends
//! over every following line indented deeper than the opener. Blank lines
//! inside (or trailing) a block never terminate it. Extents are recomputed
//! on each request and never cached.

use super::Program;

/// Clause keywords that continue a compound statement at the opener's
/// indentation
const CONTINUATION_CLAUSES: &[&str] = &["elif", "else"];

/// Number of leading whitespace characters
pub fn indent(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Whether the stripped line opens a block
pub fn is_block_opener(line: &str) -> bool {
    line.trim().ends_with(':')
}

/// Exclusive end of the block opened at `start`.
///
/// An opener on the last line yields `start + 1` (an empty body).
pub fn extent(program: &Program, start: usize) -> usize {
    let lines = program.lines();
    let Some(opener) = lines.get(start) else {
        return program.len();
    };
    scan_body(lines, start + 1, indent(opener))
}

/// [`extent`] of the opener, then of each `elif`/`else` clause that follows
/// at the opener's indentation, so a whole `if` chain forms one block.
pub fn extent_with_clauses(program: &Program, start: usize) -> usize {
    let lines = program.lines();
    let Some(opener) = lines.get(start) else {
        return program.len();
    };
    let base = indent(opener);
    let mut end = extent(program, start);

    while let Some(line) = lines.get(end) {
        if indent(line) != base || !is_continuation_clause(line) {
            break;
        }
        end = extent(program, end);
    }

    end
}

fn scan_body(lines: &[String], from: usize, base: usize) -> usize {
    let mut i = from;
    while let Some(line) = lines.get(i) {
        if !line.trim().is_empty() && indent(line) <= base {
            break;
        }
        i += 1;
    }
    i
}

fn is_continuation_clause(line: &str) -> bool {
    let stripped = line.trim();
    if !stripped.ends_with(':') {
        return false;
    }
    CONTINUATION_CLAUSES.iter().any(|kw| {
        stripped
            .strip_prefix(kw)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| !c.is_alphanumeric() && c != '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_counts_whitespace() {
        assert_eq!(indent("x = 1"), 0);
        assert_eq!(indent("    x = 1"), 4);
        assert_eq!(indent("\t\tx"), 2);
        assert_eq!(indent(""), 0);
    }

    #[test]
    fn test_simple_block() {
        let program = Program::load("for i in range(3):\n    print(i)\nx = 1");
        assert_eq!(extent(&program, 0), 2);
    }

    #[test]
    fn test_block_runs_to_end_of_program() {
        let program = Program::load("while x:\n    x -= 1\n    y = x");
        assert_eq!(extent(&program, 0), 3);
    }

    #[test]
    fn test_blank_lines_do_not_terminate() {
        let program = Program::load("if x:\n    a = 1\n\n    b = 2\n\nc = 3");
        assert_eq!(extent(&program, 0), 5);
    }

    #[test]
    fn test_opener_on_last_line() {
        let program = Program::load("x = 1\nif True:");
        assert_eq!(extent(&program, 1), 2);
    }

    #[test]
    fn test_nested_block_is_included() {
        let program = Program::load("for i in x:\n    if i:\n        y = i\n    z = 2\nw = 3");
        assert_eq!(extent(&program, 0), 4);
        assert_eq!(extent(&program, 1), 3);
    }

    #[test]
    fn test_plain_extent_stops_at_else() {
        let program = Program::load("if x:\n    a = 1\nelse:\n    a = 2\nb = 3");
        assert_eq!(extent(&program, 0), 2);
    }

    #[test]
    fn test_extent_with_clauses_absorbs_elif_else() {
        let program = Program::load(
            "if x > 1:\n    a = 1\nelif x > 0:\n    a = 2\n\nelse:\n    a = 3\nb = 4",
        );
        assert_eq!(extent_with_clauses(&program, 0), 7);
    }

    #[test]
    fn test_extent_with_clauses_without_clauses_is_extent() {
        let program = Program::load("while x:\n    x -= 1\n\ny = 2\nif y:\n    z = 1");
        for start in [0, 4, 9] {
            assert_eq!(extent_with_clauses(&program, start), extent(&program, start));
        }
    }

    #[test]
    fn test_extent_with_clauses_ignores_lookalike_names() {
        let program = Program::load("if x:\n    a = 1\nelse_count = 2");
        assert_eq!(extent_with_clauses(&program, 0), 2);
    }

    #[test]
    fn test_nested_else_belongs_to_inner_block() {
        let program = Program::load(
            "for i in x:\n    if i:\n        a = 1\n    else:\n        a = 2\nelse_marker = 1",
        );
        assert_eq!(extent_with_clauses(&program, 1), 5);
        assert_eq!(extent_with_clauses(&program, 0), 5);
    }

    #[test]
    fn test_is_block_opener() {
        assert!(is_block_opener("  for i in x:  "));
        assert!(!is_block_opener("x = {1: 2}"));
    }
}

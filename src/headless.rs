//! Non-interactive runner
//!
//! Steps a started [`Engine`] to completion (or to the first failure) and
//! writes one summary line per step, then the final environment. Used by
//! `--headless` and handy for piping a run into other tools.

use crate::interpreter::Engine;
use crate::snapshot::{truncate_repr, StepResult};
use std::io::{self, Write};
use tracing::info;

fn describe_step(result: &StepResult) -> String {
    let lines = if result.lines_consumed() > 1 {
        format!("lines {}-{}", result.cursor + 1, result.new_cursor)
    } else {
        format!("line {}", result.cursor + 1)
    };
    match (&result.error, &result.value) {
        (Some(error), _) => format!("{}: {}", lines, error.message),
        (None, Some(value)) => format!("{}: => {}", lines, value),
        (None, None) => format!("{}: ok", lines),
    }
}

/// Run every remaining step, writing a report to `out`.
///
/// Returns `Ok(true)` when the program completed and `Ok(false)` when a step
/// failed. Output printed by the program is interleaved with the step lines.
pub fn run_headless<W: Write>(
    engine: &mut Engine,
    repr_limit: usize,
    out: &mut W,
) -> io::Result<bool> {
    let mut succeeded = true;
    let mut attempts = 0;

    while !engine.is_complete() {
        let result = match engine.step() {
            Ok(result) => result,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                succeeded = false;
                break;
            }
        };

        attempts += 1;
        writeln!(out, "[{}] {}", attempts, describe_step(&result))?;
        for line in result.output.lines() {
            writeln!(out, "  | {}", line)?;
        }

        if let Some(error) = &result.error {
            for line in error.detail.lines() {
                writeln!(out, "  ! {}", line)?;
            }
            succeeded = false;
            break;
        }
    }

    let env = engine.environment();
    writeln!(out, "-- environment ({} bytes) --", env.total_size())?;
    for var in env.variables() {
        writeln!(
            out,
            "{} = {}  ({})",
            var.name,
            truncate_repr(&var.repr, repr_limit),
            var.type_name
        )?;
    }

    info!(steps = engine.steps_taken(), succeeded, "headless run finished");
    Ok(succeeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::EngineConfig;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (bool, String) {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run(source).unwrap();
        let mut out = Vec::new();
        let ok = run_headless(&mut engine, 100, &mut out).unwrap();
        (ok, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_headless_success() {
        let (ok, out) = run("x = 2\nfor i in range(2):\n    print(i * x)\nx");
        assert!(ok);
        assert_eq!(
            out,
            "[1] line 1: ok\n\
             [2] lines 2-3: ok\n\
             \x20 | 0\n\
             \x20 | 2\n\
             [3] line 4: => 2\n\
             -- environment (56 bytes) --\n\
             x = 2  (int)\n\
             i = 1  (int)\n"
        );
    }

    #[test]
    fn test_headless_stops_at_failure() {
        let (ok, out) = run("a = 1\nb = a / 0\nc = 3");
        assert!(!ok);
        assert!(out.contains("[2] line 2: ZeroDivisionError: division by zero"));
        assert!(out.contains("  ! line 2: b = a / 0"));
        assert!(!out.contains("c = 3  (int)"));
        assert!(out.ends_with("a = 1  (int)\n"));
    }

    #[test]
    fn test_headless_truncates_reprs() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run("s = 'abcdefghij'").unwrap();
        let mut out = Vec::new();
        run_headless(&mut engine, 6, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("s = 'ab...  (str)"));
    }
}

//! One unit of execution: a simple line or a whole compound block
//!
//! # Attempts
//!
//! A step first tries the current line on its own. That covers simple
//! statements, bare expressions and one-line suites (`if x: y = 1`). When the
//! line fails and ends with `:`, the block it opens (plus any `elif`/`else`
//! clauses) is joined and run as a single atomic step.
//!
//! Every attempt runs against a fork of the environment with its own output
//! capture. Only a successful attempt is committed; a failed one leaves
//! nothing behind, not even its partial output.

use crate::interpreter::engine::EngineConfig;
use crate::interpreter::errors::{EngineError, RuntimeError};
use crate::interpreter::evaluator::Evaluator;
use crate::memory::{environment::Environment, value::Value};
use crate::parser::parse_fragment;
use crate::program::{block, Program};
use crate::snapshot::{ErrorKind, OutputCapture, StepError, StepResult};

/// Result of running one fragment against a working copy
struct Attempt {
    env: Environment,
    output: String,
    value: Option<Value>,
}

fn attempt(source: &str, env: &Environment, config: &EngineConfig) -> Result<Attempt, RuntimeError> {
    let module = parse_fragment(source)?;
    let mut working = env.fork();
    let mut output = OutputCapture::new();
    let value =
        Evaluator::new(&mut working, &mut output, config.max_operations).execute_module(&module)?;
    Ok(Attempt {
        env: working,
        output: output.into_string(),
        value,
    })
}

/// Execute the step starting at `cursor`.
///
/// Fails fast with [`EngineError::Completed`] when `cursor` is past the last
/// line. Runtime failures are not `Err`: they come back inside the
/// [`StepResult`] with the environment untouched.
pub fn step(
    program: &Program,
    cursor: usize,
    env: &mut Environment,
    config: &EngineConfig,
) -> Result<StepResult, EngineError> {
    let Some(raw) = program.line(cursor) else {
        return Err(EngineError::Completed);
    };
    let line = raw.trim();

    if line.is_empty() || line.starts_with('#') {
        return Ok(StepResult {
            advanced: true,
            cursor,
            new_cursor: cursor + 1,
            output: String::new(),
            value: None,
            error: None,
            environment: env.get_all(),
        });
    }

    let mut failures = Vec::new();

    let outcome = match attempt(line, env, config) {
        Ok(done) => Ok((done, cursor + 1)),
        Err(line_err) => {
            failures.push(format!("line attempt: {}", line_err.describe()));
            if block::is_block_opener(line) {
                let end = block::extent_with_clauses(program, cursor);
                let source = program.join_range(cursor, end);
                match attempt(&source, env, config) {
                    Ok(done) => Ok((done, end)),
                    Err(block_err) => {
                        failures.push(format!(
                            "block attempt (lines {}-{}): {}",
                            cursor + 1,
                            end,
                            block_err.describe()
                        ));
                        Err(block_err)
                    }
                }
            } else {
                Err(line_err)
            }
        }
    };

    match outcome {
        Ok((done, new_cursor)) => {
            *env = done.env;
            Ok(StepResult {
                advanced: true,
                cursor,
                new_cursor,
                output: done.output,
                value: done.value.map(|value| value.repr()),
                error: None,
                environment: env.get_all(),
            })
        }
        Err(err) => {
            let mut detail = format!("line {}: {}\n{}", cursor + 1, line, err.class_name());
            for failure in &failures {
                detail.push('\n');
                detail.push_str(failure);
            }
            Ok(StepResult {
                advanced: false,
                cursor,
                new_cursor: cursor,
                output: String::new(),
                value: None,
                error: Some(StepError {
                    kind: ErrorKind::RuntimeError,
                    message: err.describe(),
                    detail,
                }),
                environment: env.get_all(),
            })
        }
    }
}

// Tree-walking evaluator for parsed fragments

use crate::interpreter::errors::RuntimeError;
use crate::memory::{environment::Environment, value::Value};
use crate::parser::ast::{AstNode, Module, SourceLocation};
use crate::snapshot::OutputCapture;

/// Pending non-local control transfer raised by `break` / `continue`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
}

/// Executes statements against an environment, writing `print` output to a
/// capture buffer.
///
/// Statement execution, expression evaluation, loops, builtins and methods
/// are split over sibling modules as further `impl Evaluator` blocks.
pub struct Evaluator<'a> {
    /// Bindings the fragment reads and writes
    pub(crate) env: &'a mut Environment,

    /// Destination of `print`
    pub(crate) output: &'a mut OutputCapture,

    /// Set by `break`/`continue`, consumed by the innermost loop
    pub(crate) control_flow: ControlFlow,

    /// Number of loops currently executing
    pub(crate) loop_depth: usize,

    operations: u64,
    max_operations: u64,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a mut Environment, output: &'a mut OutputCapture, max_operations: u64) -> Self {
        Evaluator {
            env,
            output,
            control_flow: ControlFlow::Normal,
            loop_depth: 0,
            operations: 0,
            max_operations,
        }
    }

    /// Execute every top-level statement of `module` in order.
    ///
    /// Returns the value of the last top-level bare expression, unless that
    /// value is `None`.
    pub fn execute_module(&mut self, module: &Module) -> Result<Option<Value>, RuntimeError> {
        let mut last_value = None;

        for stmt in &module.nodes {
            match stmt {
                AstNode::ExpressionStatement { expr, location } => {
                    self.tick(*location)?;
                    last_value = Some(self.evaluate_expr(expr)?);
                }
                _ => self.execute_statement(stmt)?,
            }
        }

        Ok(last_value.filter(|value| !matches!(value, Value::None)))
    }

    /// Operations consumed so far
    pub fn operations(&self) -> u64 {
        self.operations
    }

    /// Charge one operation against the budget
    pub(crate) fn tick(&mut self, location: SourceLocation) -> Result<(), RuntimeError> {
        self.operations += 1;
        if self.operations > self.max_operations {
            return Err(RuntimeError::OperationLimitExceeded {
                limit: self.max_operations,
                location,
            });
        }
        Ok(())
    }
}

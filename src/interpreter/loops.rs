//! Loop statement execution (`while`, `for`).
//!
//! Adds `impl Evaluator` methods for the two loop forms of the scripting
//! subset. `break` and `continue` are propagated via `LoopBodyResult` so
//! the loop driver can react without inspecting `control_flow` directly.
//!
//! Every iteration is charged against the operation budget, which is what
//! stops a non-terminating loop inside a block step.

use crate::interpreter::evaluator::{ControlFlow, Evaluator};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::iterate_values;
use crate::memory::value::{range_len, Value};
use crate::parser::ast::{AstNode, SourceLocation};

/// Result returned by [`Evaluator::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally or via `continue`; the loop should iterate again.
    Continue,
    /// `break` was encountered; the loop should exit cleanly.
    Break,
}

impl Evaluator<'_> {
    /// Executes all statements in `body` once.
    ///
    /// Returns [`LoopBodyResult::Continue`] if the body ran to completion or hit
    /// `continue`, and [`LoopBodyResult::Break`] on `break`.
    pub(crate) fn execute_loop_body(
        &mut self,
        body: &[AstNode],
    ) -> Result<LoopBodyResult, RuntimeError> {
        self.execute_block(body)?;
        let signal = std::mem::replace(&mut self.control_flow, ControlFlow::Normal);
        Ok(match signal {
            ControlFlow::Break => LoopBodyResult::Break,
            ControlFlow::Continue | ControlFlow::Normal => LoopBodyResult::Continue,
        })
    }

    /// Executes a `while condition: body` loop.
    ///
    /// The condition is evaluated before each iteration and each evaluation
    /// costs one operation.
    pub(crate) fn execute_while(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        self.loop_depth += 1;
        let result = self.run_while(condition, body, location);
        self.loop_depth -= 1;
        result
    }

    fn run_while(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        loop {
            self.tick(location)?;
            if !self.evaluate_expr(condition)?.is_truthy() {
                return Ok(());
            }

            match self.execute_loop_body(body)? {
                LoopBodyResult::Break => return Ok(()),
                LoopBodyResult::Continue => continue,
            }
        }
    }

    /// Executes a `for target in iterable: body` loop.
    ///
    /// The iterable is evaluated once. Ranges are walked lazily and lists are
    /// walked live by index, so items appended in the body are visited too.
    /// Every other iterable is materialised up front.
    pub(crate) fn execute_for(
        &mut self,
        target: &AstNode,
        iterable: &AstNode,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let iterable = self.evaluate_expr(iterable)?;

        self.loop_depth += 1;
        let result = self.run_for(target, iterable, body, location);
        self.loop_depth -= 1;
        result
    }

    fn run_for(
        &mut self,
        target: &AstNode,
        iterable: Value,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if let Value::Range { start, stop, step } = iterable {
            for i in 0..range_len(start, stop, step) {
                let item = (start as i128 + i as i128 * step as i128) as i64;
                if self.run_iteration(target, Value::Int(item), body, location)? {
                    break;
                }
            }
            return Ok(());
        }

        if let Value::List(items) = &iterable {
            let mut index = 0;
            loop {
                let next = items.borrow().get(index).cloned();
                let Some(item) = next else {
                    return Ok(());
                };
                index += 1;
                if self.run_iteration(target, item, body, location)? {
                    return Ok(());
                }
            }
        }

        for item in iterate_values(&iterable, location)? {
            if self.run_iteration(target, item, body, location)? {
                break;
            }
        }
        Ok(())
    }

    /// Bind the loop target and run the body once; returns `true` on `break`
    fn run_iteration(
        &mut self,
        target: &AstNode,
        item: Value,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        self.tick(location)?;
        self.assign_to_target(target, item, location)?;
        Ok(matches!(
            self.execute_loop_body(body)?,
            LoopBodyResult::Break
        ))
    }
}

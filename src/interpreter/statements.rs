//! Statement execution implementation
//!
//! This module handles the execution of every statement form of the
//! scripting subset:
//!
//! - Expression statements
//! - Assignments (chained, tuple unpacking, subscript and slice targets)
//! - Augmented assignments (`+=`, `-=`, ...)
//! - `if` / `elif` / `else`
//! - `break`, `continue`, `pass`
//!
//! Loops live in [`super::loops`].
//!
//! # Implementation
//!
//! All statement execution methods are implemented as `pub(crate)` methods
//! on the [`Evaluator`] struct, allowing them to read and update the
//! environment and the output capture.
//!
//! # Control Flow
//!
//! `break` and `continue` set `control_flow`; [`Evaluator::execute_block`]
//! stops at the first statement that leaves it non-normal so the enclosing
//! loop can react.

use crate::interpreter::evaluator::{ControlFlow, Evaluator};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::{get_item, set_item};
use crate::interpreter::ops::binary::apply_inplace;
use crate::parser::ast::*;

impl Evaluator<'_> {
    pub(crate) fn execute_statement(&mut self, stmt: &AstNode) -> Result<(), RuntimeError> {
        self.tick(stmt.location())?;

        match stmt {
            AstNode::ExpressionStatement { expr, .. } => {
                self.evaluate_expr(expr)?;
                Ok(())
            }

            AstNode::Assignment {
                targets,
                value,
                location,
            } => self.execute_assignment(targets, value, *location),

            AstNode::CompoundAssignment {
                target,
                op,
                value,
                location,
            } => self.execute_compound_assignment(target, *op, value, *location),

            AstNode::If {
                branches,
                else_branch,
                ..
            } => self.execute_if(branches, else_branch.as_deref()),

            AstNode::While {
                condition,
                body,
                location,
            } => self.execute_while(condition, body, *location),

            AstNode::For {
                target,
                iterable,
                body,
                location,
            } => self.execute_for(target, iterable, body, *location),

            AstNode::Break { location } => {
                if self.loop_depth == 0 {
                    return Err(RuntimeError::LoopControlOutsideLoop {
                        keyword: "break",
                        location: *location,
                    });
                }
                self.control_flow = ControlFlow::Break;
                Ok(())
            }

            AstNode::Continue { location } => {
                if self.loop_depth == 0 {
                    return Err(RuntimeError::LoopControlOutsideLoop {
                        keyword: "continue",
                        location: *location,
                    });
                }
                self.control_flow = ControlFlow::Continue;
                Ok(())
            }

            AstNode::Pass { .. } => Ok(()),

            other => Err(RuntimeError::UnsupportedOperation {
                message: "expression used where a statement was expected".to_string(),
                location: other.location(),
            }),
        }
    }

    /// Run statements in order until one raises a control-flow signal
    pub(crate) fn execute_block(&mut self, body: &[AstNode]) -> Result<(), RuntimeError> {
        for stmt in body {
            self.execute_statement(stmt)?;
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
        Ok(())
    }

    /// `a = b = value`: the value is evaluated once, then bound to every
    /// target from left to right
    fn execute_assignment(
        &mut self,
        targets: &[AstNode],
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let value = self.evaluate_expr(value)?;
        if let Some((last, rest)) = targets.split_last() {
            for target in rest {
                self.assign_to_target(target, value.clone(), location)?;
            }
            self.assign_to_target(last, value, location)?;
        }
        Ok(())
    }

    /// `target op= value`. Container and key are evaluated once, before the
    /// right-hand side; a list on the left of `+=` or `*=` is updated in place.
    fn execute_compound_assignment(
        &mut self,
        target: &AstNode,
        op: BinOp,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match target {
            AstNode::Variable(name, var_loc) => {
                let current = self.lookup_variable(name, *var_loc)?;
                let rhs = self.evaluate_expr(value)?;
                let result = apply_inplace(op, current, rhs, location)?;
                self.env.set(name, result);
                Ok(())
            }
            AstNode::Index {
                object,
                subscript: Subscript::Index(index),
                location: index_loc,
            } => {
                let container = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                let current = get_item(&container, &key, *index_loc)?;
                let rhs = self.evaluate_expr(value)?;
                let result = apply_inplace(op, current, rhs, location)?;
                set_item(&container, key, result, *index_loc)
            }
            other => Err(RuntimeError::UnsupportedOperation {
                message: "illegal target for augmented assignment".to_string(),
                location: other.location(),
            }),
        }
    }

    fn execute_if(
        &mut self,
        branches: &[(AstNode, Vec<AstNode>)],
        else_branch: Option<&[AstNode]>,
    ) -> Result<(), RuntimeError> {
        for (condition, body) in branches {
            if self.evaluate_expr(condition)?.is_truthy() {
                return self.execute_block(body);
            }
        }

        if let Some(body) = else_branch {
            self.execute_block(body)?;
        }

        Ok(())
    }
}

//! Assignment targets
//!
//! Names are rebound in the environment. Subscript and slice targets
//! evaluate their container to a shared handle and update it in place, so
//! `grid[1][2] = 0` reaches the row that `grid` holds and every other name
//! bound to it.

use crate::interpreter::evaluator::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::{is_iterable, iterate_values, set_item, set_slice};
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, SourceLocation, Subscript};

impl Evaluator<'_> {
    /// Bind `value` to an assignment target
    pub(crate) fn assign_to_target(
        &mut self,
        target: &AstNode,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match target {
            AstNode::Variable(name, _) => {
                self.env.set(name, value);
                Ok(())
            }

            AstNode::TupleLiteral(targets, _) | AstNode::ListLiteral(targets, _) => {
                if !is_iterable(&value) {
                    return Err(RuntimeError::type_error(
                        format!("cannot unpack non-iterable {} object", value.type_name()),
                        location,
                    ));
                }
                let values = iterate_values(&value, location)?;
                if values.len() > targets.len() {
                    return Err(RuntimeError::value_error(
                        format!("too many values to unpack (expected {})", targets.len()),
                        location,
                    ));
                }
                if values.len() < targets.len() {
                    return Err(RuntimeError::value_error(
                        format!(
                            "not enough values to unpack (expected {}, got {})",
                            targets.len(),
                            values.len()
                        ),
                        location,
                    ));
                }
                for (target, item) in targets.iter().zip(values) {
                    self.assign_to_target(target, item, location)?;
                }
                Ok(())
            }

            AstNode::Index {
                object,
                subscript,
                location: index_loc,
            } => {
                let container = self.evaluate_expr(object)?;
                match subscript {
                    Subscript::Index(index) => {
                        let key = self.evaluate_expr(index)?;
                        set_item(&container, key, value, *index_loc)
                    }
                    Subscript::Slice { lower, upper } => {
                        let lower = self.evaluate_slice_bound(lower.as_deref())?;
                        let upper = self.evaluate_slice_bound(upper.as_deref())?;
                        set_slice(&container, lower, upper, value, *index_loc)
                    }
                }
            }

            other => Err(RuntimeError::UnsupportedOperation {
                message: "cannot assign to expression".to_string(),
                location: other.location(),
            }),
        }
    }
}

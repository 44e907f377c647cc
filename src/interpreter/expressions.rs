//! Expression evaluation implementation
//!
//! This module handles the evaluation of all expression types:
//!
//! - Literals, displays (`[...]`, `(...)`, `{...}`) and f-strings
//! - Variables (environment first, then the builtin table)
//! - Arithmetic, unary, boolean and chained comparison operators
//! - Conditional expressions
//! - Builtin calls and method calls
//! - Indexing and slicing
//!
//! # Evaluation Order
//!
//! Operands are evaluated left to right. `and`/`or` short-circuit and yield
//! the deciding operand itself, not a bool. A comparison chain evaluates each
//! middle operand once and stops at the first false link.

use crate::interpreter::builtins::format_with_spec;
use crate::interpreter::constants::BUILTIN_NAMES;
use crate::interpreter::evaluator::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::methods::call_method;
use crate::interpreter::ops::access::{check_hashable, get_item, get_slice};
use crate::interpreter::ops::binary::{apply_binary, apply_compare};
use crate::interpreter::ops::unary::apply_unary;
use crate::memory::value::{dict_lookup, Value};
use crate::parser::ast::*;

impl Evaluator<'_> {
    pub(crate) fn evaluate_expr(&mut self, expr: &AstNode) -> Result<Value, RuntimeError> {
        match expr {
            AstNode::IntLiteral(n, _) => Ok(Value::Int(*n)),
            AstNode::FloatLiteral(x, _) => Ok(Value::Float(*x)),
            AstNode::StringLiteral(s, _) => Ok(Value::Str(s.clone())),
            AstNode::BoolLiteral(b, _) => Ok(Value::Bool(*b)),
            AstNode::NoneLiteral(_) => Ok(Value::None),
            AstNode::FString(parts, location) => self.evaluate_fstring(parts, *location),

            AstNode::Variable(name, location) => self.lookup_variable(name, *location),

            AstNode::ListLiteral(items, _) => Ok(Value::list(self.evaluate_all(items)?)),
            AstNode::TupleLiteral(items, _) => Ok(Value::Tuple(self.evaluate_all(items)?)),
            AstNode::DictLiteral(entries, location) => self.evaluate_dict(entries, *location),

            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => {
                let left = self.evaluate_expr(left)?;
                let right = self.evaluate_expr(right)?;
                apply_binary(*op, left, right, *location)
            }

            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => {
                let operand = self.evaluate_expr(operand)?;
                apply_unary(*op, operand, *location)
            }

            AstNode::BoolOp {
                op, left, right, ..
            } => {
                let left = self.evaluate_expr(left)?;
                let decided = match op {
                    BoolOp::And => !left.is_truthy(),
                    BoolOp::Or => left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate_expr(right)
                }
            }

            AstNode::Compare {
                left,
                comparisons,
                location,
            } => self.evaluate_comparison(left, comparisons, *location),

            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.evaluate_expr(true_expr)
                } else {
                    self.evaluate_expr(false_expr)
                }
            }

            AstNode::FunctionCall {
                name,
                args,
                kwargs,
                location,
            } => self.evaluate_function_call(name, args, kwargs, *location),

            AstNode::MethodCall {
                receiver,
                method,
                args,
                kwargs,
                location,
            } => self.evaluate_method_call(receiver, method, args, kwargs, *location),

            AstNode::Index {
                object,
                subscript,
                location,
            } => {
                let container = self.evaluate_expr(object)?;
                match subscript {
                    Subscript::Index(index) => {
                        let key = self.evaluate_expr(index)?;
                        get_item(&container, &key, *location)
                    }
                    Subscript::Slice { lower, upper } => {
                        let lower = self.evaluate_slice_bound(lower.as_deref())?;
                        let upper = self.evaluate_slice_bound(upper.as_deref())?;
                        get_slice(&container, lower, upper, *location)
                    }
                }
            }

            other => Err(RuntimeError::UnsupportedOperation {
                message: "statement used where an expression was expected".to_string(),
                location: other.location(),
            }),
        }
    }

    /// Variable lookup: bindings first, then builtins
    pub(crate) fn lookup_variable(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }
        if BUILTIN_NAMES.contains(&name) {
            return Err(RuntimeError::UnsupportedOperation {
                message: format!("builtin '{}' can only be called, not used as a value", name),
                location,
            });
        }
        Err(RuntimeError::UndefinedVariable {
            name: name.to_string(),
            location,
        })
    }

    /// Evaluate an optional slice bound; `None` and a missing bound are alike
    pub(crate) fn evaluate_slice_bound(
        &mut self,
        bound: Option<&AstNode>,
    ) -> Result<Option<i64>, RuntimeError> {
        let Some(bound) = bound else {
            return Ok(None);
        };
        match self.evaluate_expr(bound)? {
            Value::None => Ok(None),
            value => value.as_int().map(Some).ok_or_else(|| {
                RuntimeError::type_error("slice indices must be integers or None", bound.location())
            }),
        }
    }

    fn evaluate_all(&mut self, items: &[AstNode]) -> Result<Vec<Value>, RuntimeError> {
        items.iter().map(|item| self.evaluate_expr(item)).collect()
    }

    /// Dict display; a repeated key keeps its first position and last value
    fn evaluate_dict(
        &mut self,
        entries: &[(AstNode, AstNode)],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        for (key_expr, value_expr) in entries {
            let key = self.evaluate_expr(key_expr)?;
            check_hashable(&key, location)?;
            let value = self.evaluate_expr(value_expr)?;
            match dict_lookup(&pairs, &key) {
                Some(i) => pairs[i].1 = value,
                None => pairs.push((key, value)),
            }
        }
        Ok(Value::dict(pairs))
    }

    fn evaluate_comparison(
        &mut self,
        left: &AstNode,
        comparisons: &[(CmpOp, AstNode)],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut current = self.evaluate_expr(left)?;
        for (op, right_expr) in comparisons {
            let right = self.evaluate_expr(right_expr)?;
            if !apply_compare(*op, &current, &right, location)? {
                return Ok(Value::Bool(false));
            }
            current = right;
        }
        Ok(Value::Bool(true))
    }

    fn evaluate_fstring(
        &mut self,
        parts: &[FStringPart],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut text = String::new();
        for part in parts {
            match part {
                FStringPart::Text(literal) => text.push_str(literal),
                FStringPart::Expr { expr, repr, spec } => {
                    let value = self.evaluate_expr(expr)?;
                    if *repr {
                        let rendered = Value::Str(value.repr());
                        text.push_str(&format_with_spec(&rendered, spec, location)?);
                    } else {
                        text.push_str(&format_with_spec(&value, spec, location)?);
                    }
                }
            }
        }
        Ok(Value::Str(text))
    }

    fn evaluate_function_call(
        &mut self,
        name: &str,
        args: &[AstNode],
        kwargs: &[(String, AstNode)],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        // A binding shadows the builtin of the same name
        if let Some(value) = self.env.get(name) {
            return Err(RuntimeError::type_error(
                format!("'{}' object is not callable", value.type_name()),
                location,
            ));
        }
        if !BUILTIN_NAMES.contains(&name) {
            return Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                location,
            });
        }

        let args = self.evaluate_all(args)?;
        let kwargs = self.evaluate_kwargs(kwargs)?;
        self.call_builtin(name, args, kwargs, location)
    }

    fn evaluate_kwargs(
        &mut self,
        kwargs: &[(String, AstNode)],
    ) -> Result<Vec<(String, Value)>, RuntimeError> {
        kwargs
            .iter()
            .map(|(name, expr)| Ok((name.clone(), self.evaluate_expr(expr)?)))
            .collect()
    }

    /// The receiver is evaluated before the arguments; list and dict
    /// receivers are shared, so mutations reach every binding of them
    fn evaluate_method_call(
        &mut self,
        receiver: &AstNode,
        method: &str,
        args: &[AstNode],
        kwargs: &[(String, AstNode)],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let receiver = self.evaluate_expr(receiver)?;
        let args = self.evaluate_all(args)?;
        let kwargs = self.evaluate_kwargs(kwargs)?;
        call_method(&receiver, method, args, kwargs, location)
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::evaluator::Evaluator;
    use crate::interpreter::errors::RuntimeError;
    use crate::memory::{environment::Environment, value::Value};
    use crate::parser::parse_fragment;
    use crate::snapshot::OutputCapture;

    fn eval_in(env: &mut Environment, source: &str) -> Result<Value, RuntimeError> {
        let module = parse_fragment(source)?;
        let mut output = OutputCapture::new();
        Ok(Evaluator::new(env, &mut output, 10_000)
            .execute_module(&module)?
            .unwrap_or(Value::None))
    }

    fn eval(source: &str) -> Result<Value, RuntimeError> {
        eval_in(&mut Environment::new(), source)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4"), Ok(Value::Int(14)));
        assert_eq!(eval("(2 + 3) * 4"), Ok(Value::Int(20)));
        assert_eq!(eval("-2 ** 2"), Ok(Value::Int(-4)));
        assert_eq!(eval("2 ** 3 ** 2"), Ok(Value::Int(512)));
        assert_eq!(eval("not 1 == 2"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_short_circuit_returns_operand() {
        assert_eq!(eval("0 or 'x'"), Ok(Value::Str("x".to_string())));
        assert_eq!(eval("[] and undefined_name"), Ok(Value::list(vec![])));
        assert_eq!(eval("1 and 2"), Ok(Value::Int(2)));
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(eval("1 < 2 < 3"), Ok(Value::Bool(true)));
        assert_eq!(eval("1 < 3 < 2"), Ok(Value::Bool(false)));
        assert_eq!(eval("3 not in [1, 2]"), Ok(Value::Bool(true)));
        assert_eq!(eval("None is None"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_ternary() {
        assert_eq!(eval("'yes' if 2 > 1 else 'no'"), Ok(Value::Str("yes".to_string())));
    }

    #[test]
    fn test_indexing_and_slicing() {
        assert_eq!(eval("'hello'[1:3]"), Ok(Value::Str("el".to_string())));
        assert_eq!(eval("[1, 2, 3][-1]"), Ok(Value::Int(3)));
        assert_eq!(eval("{'a': 1}['a']"), Ok(Value::Int(1)));
        assert!(eval("list(range(10))[::]").is_err());
    }

    #[test]
    fn test_fstrings() {
        let mut env = Environment::new();
        env.set("name", Value::Str("Ada".to_string()));
        env.set("pi", Value::Float(3.14159));
        assert_eq!(
            eval_in(&mut env, "f'{name!r} has {len(name)} letters, pi={pi:.2f}'"),
            Ok(Value::Str("'Ada' has 3 letters, pi=3.14".to_string()))
        );
    }

    #[test]
    fn test_dict_display_with_repeated_key() {
        assert_eq!(
            eval("{'a': 1, 'b': 2, 'a': 3}").map(|v| v.repr()),
            Ok("{'a': 3, 'b': 2}".to_string())
        );
        assert!(eval("{[1]: 2}").is_err());
    }

    #[test]
    fn test_name_errors() {
        assert_eq!(
            eval("foo + 1").unwrap_err().describe(),
            "NameError: name 'foo' is not defined"
        );
        assert_eq!(
            eval("foo(1)").unwrap_err().describe(),
            "NameError: name 'foo' is not defined"
        );
    }

    #[test]
    fn test_shadowed_builtin_is_not_callable() {
        let mut env = Environment::new();
        env.set("len", Value::Int(3));
        assert_eq!(
            eval_in(&mut env, "len([1])").unwrap_err().describe(),
            "TypeError: 'int' object is not callable"
        );
    }

    #[test]
    fn test_identity_of_lists() {
        let mut env = Environment::new();
        eval_in(&mut env, "a = [1]\nb = a\nc = [1]").unwrap();
        assert_eq!(eval_in(&mut env, "a is b"), Ok(Value::Bool(true)));
        assert_eq!(eval_in(&mut env, "a is c"), Ok(Value::Bool(false)));
        assert_eq!(eval_in(&mut env, "a == c"), Ok(Value::Bool(true)));
        assert_eq!(eval_in(&mut env, "[] is []"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_method_on_temporary_leaves_env_alone() {
        let mut env = Environment::new();
        env.set("s", Value::Str("abc".to_string()));
        assert_eq!(eval_in(&mut env, "s.upper()"), Ok(Value::Str("ABC".to_string())));
        assert_eq!(env.get("s"), Some(&Value::Str("abc".to_string())));
    }
}

//! Unary operator evaluation

use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{SourceLocation, UnOp};

pub(crate) fn apply_unary(
    op: UnOp,
    operand: Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnOp::Pos, Value::Float(x)) => Ok(Value::Float(x)),
        (UnOp::Neg, value) if value.as_int().is_some() => {
            let n = value.as_int().unwrap_or(0);
            n.checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::Overflow {
                    message: format!("integer overflow in -({}) (ints are 64-bit)", n),
                    location,
                })
        }
        (UnOp::Pos, value) if value.as_int().is_some() => Ok(Value::Int(value.as_int().unwrap_or(0))),
        (op, value) => Err(RuntimeError::type_error(
            format!(
                "bad operand type for unary {}: '{}'",
                if op == UnOp::Neg { "-" } else { "+" },
                value.type_name()
            ),
            location,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_operators() {
        let loc = SourceLocation::new(1, 1);
        assert_eq!(apply_unary(UnOp::Neg, Value::Int(3), loc), Ok(Value::Int(-3)));
        assert_eq!(apply_unary(UnOp::Neg, Value::Bool(true), loc), Ok(Value::Int(-1)));
        assert_eq!(apply_unary(UnOp::Pos, Value::Float(2.5), loc), Ok(Value::Float(2.5)));
        assert_eq!(apply_unary(UnOp::Not, Value::list(vec![]), loc), Ok(Value::Bool(true)));
        assert!(apply_unary(UnOp::Neg, Value::Int(i64::MIN), loc).is_err());
        let err = apply_unary(UnOp::Neg, Value::Str("x".into()), loc).unwrap_err();
        assert_eq!(err.to_string(), "bad operand type for unary -: 'str'");
    }
}

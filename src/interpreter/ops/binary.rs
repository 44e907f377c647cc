//! Binary arithmetic and comparison operators

use crate::interpreter::constants::MAX_SEQUENCE_LENGTH;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::{contains, iterate_values};
use crate::memory::value::Value;
use crate::parser::ast::{BinOp, CmpOp, SourceLocation};
use std::cmp::Ordering;
use std::rc::Rc;

/// Apply an arithmetic operator. Bools take part as the ints 0 and 1; an int
/// meeting a float is widened to float.
pub(crate) fn apply_binary(
    op: BinOp,
    left: Value,
    right: Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    if !matches!(left, Value::Float(_)) && !matches!(right, Value::Float(_)) {
        if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
            return int_arith(op, a, b, location);
        }
    }

    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return float_arith(op, a, b, location);
    }

    match (op, left, right) {
        (BinOp::Add, Value::Str(mut a), Value::Str(b)) => {
            a.push_str(&b);
            Ok(Value::Str(a))
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (BinOp::Add, Value::Tuple(mut a), Value::Tuple(b)) => {
            a.extend(b);
            Ok(Value::Tuple(a))
        }
        (BinOp::Add, left @ (Value::Str(_) | Value::List(_) | Value::Tuple(_)), right) => {
            Err(RuntimeError::type_error(
                format!(
                    "can only concatenate {} (not \"{}\") to {}",
                    left.type_name(),
                    right.type_name(),
                    left.type_name()
                ),
                location,
            ))
        }

        (BinOp::Mul, Value::Str(s), count) | (BinOp::Mul, count, Value::Str(s))
            if count.as_int().is_some() =>
        {
            let times = repeat_count(s.chars().count(), count.as_int().unwrap_or(0), location)?;
            Ok(Value::Str(s.repeat(times)))
        }
        (BinOp::Mul, Value::List(items), count) | (BinOp::Mul, count, Value::List(items))
            if count.as_int().is_some() =>
        {
            let items = items.borrow();
            let times = repeat_count(items.len(), count.as_int().unwrap_or(0), location)?;
            Ok(Value::list(repeat_items(&items, times)))
        }
        (BinOp::Mul, Value::Tuple(items), count) | (BinOp::Mul, count, Value::Tuple(items))
            if count.as_int().is_some() =>
        {
            let times = repeat_count(items.len(), count.as_int().unwrap_or(0), location)?;
            Ok(Value::Tuple(repeat_items(&items, times)))
        }

        (BinOp::Mod, Value::Str(_), _) => Err(RuntimeError::UnsupportedOperation {
            message: "'%' string formatting is not supported; use an f-string".to_string(),
            location,
        }),

        (op, left, right) => Err(RuntimeError::type_error(
            format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
            location,
        )),
    }
}

/// Augmented assignment (`x op= y`). Lists are updated in place for `+=`
/// and `*=`, so every name bound to the list sees the change; everything
/// else falls back to [`apply_binary`].
pub(crate) fn apply_inplace(
    op: BinOp,
    left: Value,
    right: Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match (op, &left) {
        (BinOp::Add, Value::List(items)) => {
            // `xs += xs` reads its operand before the list is borrowed mutably
            let extra = iterate_values(&right, location)?;
            items.borrow_mut().extend(extra);
            Ok(left)
        }
        (BinOp::Mul, Value::List(items)) if right.as_int().is_some() => {
            let current = items.borrow().clone();
            let times = repeat_count(current.len(), right.as_int().unwrap_or(0), location)?;
            *items.borrow_mut() = repeat_items(&current, times);
            Ok(left)
        }
        _ => apply_binary(op, left, right, location),
    }
}

/// `times` back-to-back copies of `items`; nested containers are shared,
/// not copied, as with `[[0] * 2] * 2`
fn repeat_items(items: &[Value], times: usize) -> Vec<Value> {
    std::iter::repeat(items.iter().cloned())
        .take(times)
        .flatten()
        .collect()
}

fn int_arith(op: BinOp, a: i64, b: i64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::Overflow {
        message: format!(
            "integer overflow in {} {} {} (ints are 64-bit)",
            a,
            op.symbol(),
            b
        ),
        location,
    };

    match op {
        BinOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
        BinOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
        BinOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
        BinOp::Div => {
            if b == 0 {
                return Err(division_by_zero("division by zero", location));
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(division_by_zero("integer division or modulo by zero", location));
            }
            floor_div(a, b).map(Value::Int).ok_or_else(overflow)
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(division_by_zero("integer division or modulo by zero", location));
            }
            Ok(Value::Int(floor_mod(a, b)))
        }
        BinOp::Pow => {
            if b >= 0 {
                u32::try_from(b)
                    .ok()
                    .and_then(|exp| a.checked_pow(exp))
                    .map(Value::Int)
                    .ok_or_else(overflow)
            } else {
                float_arith(op, a as f64, b as f64, location)
            }
        }
    }
}

fn float_arith(op: BinOp, a: f64, b: f64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(division_by_zero("float division by zero", location));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(division_by_zero("float floor division by zero", location));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(division_by_zero("float modulo", location));
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(division_by_zero(
                    "0.0 cannot be raised to a negative power",
                    location,
                ));
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(RuntimeError::value_error(
                    "negative number cannot be raised to a fractional power",
                    location,
                ));
            }
            let r = a.powf(b);
            if r.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(RuntimeError::Overflow {
                    message: "numerical result out of range".to_string(),
                    location,
                });
            }
            r
        }
    };
    Ok(Value::Float(result))
}

/// Integer division rounding toward negative infinity
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.checked_rem(b).unwrap_or(0);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

fn repeat_count(len: usize, count: i64, location: SourceLocation) -> Result<usize, RuntimeError> {
    if count <= 0 {
        return Ok(0);
    }
    let times = usize::try_from(count).unwrap_or(usize::MAX);
    if len.saturating_mul(times) > MAX_SEQUENCE_LENGTH {
        return Err(RuntimeError::Overflow {
            message: "repeated sequence is too long".to_string(),
            location,
        });
    }
    Ok(times)
}

fn division_by_zero(message: &str, location: SourceLocation) -> RuntimeError {
    RuntimeError::DivisionByZero {
        message: message.to_string(),
        location,
    }
}

/// Evaluate one link of a comparison chain
pub(crate) fn apply_compare(
    op: CmpOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<bool, RuntimeError> {
    match op {
        CmpOp::Eq => Ok(left.equals(right)),
        CmpOp::Ne => Ok(!left.equals(right)),
        CmpOp::Lt => Ok(ordering(op, left, right, location)? == Some(Ordering::Less)),
        CmpOp::Le => Ok(matches!(
            ordering(op, left, right, location)?,
            Some(Ordering::Less | Ordering::Equal)
        )),
        CmpOp::Gt => Ok(ordering(op, left, right, location)? == Some(Ordering::Greater)),
        CmpOp::Ge => Ok(matches!(
            ordering(op, left, right, location)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
        CmpOp::In => contains(right, left, location),
        CmpOp::NotIn => Ok(!contains(right, left, location)?),
        CmpOp::Is => Ok(is_same(left, right)),
        CmpOp::IsNot => Ok(!is_same(left, right)),
    }
}

/// Ordering of two values; `None` only for NaN comparisons, which are false
fn ordering(
    op: CmpOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Option<Ordering>, RuntimeError> {
    match left.compare(right) {
        Some(ord) => Ok(Some(ord)),
        None if left.is_number() && right.is_number() => Ok(None),
        None => Err(RuntimeError::type_error(
            format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
            location,
        )),
    }
}

/// Identity: lists and dicts are identical when they are the same handle;
/// of the immutable values only the singletons `None`, `True` and `False`
/// are
fn is_same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn eval(op: BinOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
        apply_binary(op, left, right, loc())
    }

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(eval(BinOp::Add, Value::Int(2), Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(eval(BinOp::Div, Value::Int(7), Value::Int(2)), Ok(Value::Float(3.5)));
        assert_eq!(eval(BinOp::FloorDiv, Value::Int(-7), Value::Int(2)), Ok(Value::Int(-4)));
        assert_eq!(eval(BinOp::Mod, Value::Int(-7), Value::Int(3)), Ok(Value::Int(2)));
        assert_eq!(eval(BinOp::Mod, Value::Int(7), Value::Int(-3)), Ok(Value::Int(-2)));
        assert_eq!(eval(BinOp::Pow, Value::Int(2), Value::Int(10)), Ok(Value::Int(1024)));
        assert_eq!(eval(BinOp::Pow, Value::Int(2), Value::Int(-1)), Ok(Value::Float(0.5)));
        assert_eq!(eval(BinOp::Add, Value::Bool(true), Value::Bool(true)), Ok(Value::Int(2)));
    }

    #[test]
    fn test_mixed_arithmetic_widens_to_float() {
        assert_eq!(eval(BinOp::Add, Value::Int(1), Value::Float(0.5)), Ok(Value::Float(1.5)));
        assert_eq!(
            eval(BinOp::FloorDiv, Value::Float(7.0), Value::Int(2)),
            Ok(Value::Float(3.0))
        );
    }

    #[test]
    fn test_division_by_zero() {
        let err = eval(BinOp::Div, Value::Int(1), Value::Int(0)).unwrap_err();
        assert_eq!(err.describe(), "ZeroDivisionError: division by zero");
        let err = eval(BinOp::Mod, Value::Int(1), Value::Int(0)).unwrap_err();
        assert_eq!(err.class_name(), "ZeroDivisionError");
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = eval(BinOp::Mul, Value::Int(i64::MAX), Value::Int(2)).unwrap_err();
        assert_eq!(err.class_name(), "OverflowError");
        assert!(eval(BinOp::FloorDiv, Value::Int(i64::MIN), Value::Int(-1)).is_err());
    }

    #[test]
    fn test_sequence_operators() {
        assert_eq!(
            eval(BinOp::Add, Value::Str("ab".into()), Value::Str("c".into())),
            Ok(Value::Str("abc".into()))
        );
        assert_eq!(
            eval(BinOp::Mul, Value::Int(3), Value::Str("ab".into())),
            Ok(Value::Str("ababab".into()))
        );
        assert_eq!(
            eval(BinOp::Mul, Value::list(vec![Value::Int(0)]), Value::Int(2)),
            Ok(Value::list(vec![Value::Int(0), Value::Int(0)]))
        );
        let err = eval(BinOp::Add, Value::Str("a".into()), Value::Int(1)).unwrap_err();
        assert_eq!(
            err.describe(),
            "TypeError: can only concatenate str (not \"int\") to str"
        );
    }

    #[test]
    fn test_sequence_repetition() {
        assert_eq!(
            eval(BinOp::Mul, Value::list(vec![Value::Int(0)]), Value::Int(3)).map(|v| v.repr()),
            Ok("[0, 0, 0]".to_string())
        );
        assert_eq!(
            eval(
                BinOp::Mul,
                Value::Tuple(vec![Value::Int(1), Value::Int(2)]),
                Value::Int(2)
            )
            .map(|v| v.repr()),
            Ok("(1, 2, 1, 2)".to_string())
        );
        assert_eq!(
            eval(BinOp::Mul, Value::Int(-1), Value::Tuple(vec![Value::Int(1)])),
            Ok(Value::Tuple(vec![]))
        );

        // Rows of a repeated list are the same list
        let row = Value::list(vec![Value::Int(0)]);
        let grid = eval(BinOp::Mul, Value::list(vec![row.clone()]), Value::Int(2)).unwrap();
        if let Value::List(items) = &row {
            items.borrow_mut()[0] = Value::Int(5);
        }
        assert_eq!(grid.repr(), "[[5], [5]]");
    }

    #[test]
    fn test_inplace_add_extends_shared_list() {
        let xs = Value::list(vec![Value::Int(1)]);
        let alias = xs.clone();
        let result = apply_inplace(BinOp::Add, xs, Value::Str("ab".into()), loc()).unwrap();
        assert_eq!(alias.repr(), "[1, 'a', 'b']");
        assert_eq!(apply_compare(CmpOp::Is, &result, &alias, loc()), Ok(true));

        let err = apply_inplace(BinOp::Add, alias, Value::Int(3), loc()).unwrap_err();
        assert_eq!(err.describe(), "TypeError: 'int' object is not iterable");
        assert_eq!(
            apply_inplace(BinOp::Add, Value::Int(1), Value::Int(2), loc()),
            Ok(Value::Int(3))
        );
    }

    #[test]
    fn test_unsupported_operands() {
        let err = eval(BinOp::Sub, Value::Str("a".into()), Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for -: 'str' and 'int'"
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(apply_compare(CmpOp::Lt, &Value::Int(1), &Value::Float(1.5), loc()), Ok(true));
        assert_eq!(apply_compare(CmpOp::Eq, &Value::Int(1), &Value::Float(1.0), loc()), Ok(true));
        assert_eq!(
            apply_compare(CmpOp::Lt, &Value::Float(f64::NAN), &Value::Int(1), loc()),
            Ok(false)
        );
        assert!(apply_compare(CmpOp::Lt, &Value::Int(1), &Value::Str("a".into()), loc()).is_err());
        assert_eq!(apply_compare(CmpOp::Is, &Value::None, &Value::None, loc()), Ok(true));
        assert_eq!(
            apply_compare(CmpOp::In, &Value::Str("ell".into()), &Value::Str("hello".into()), loc()),
            Ok(true)
        );
    }
}

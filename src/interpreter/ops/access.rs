//! Subscript, slice, membership and iteration helpers

use crate::interpreter::constants::MAX_SEQUENCE_LENGTH;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{dict_lookup, range_len, Value};
use crate::parser::ast::SourceLocation;

/// Resolve a possibly negative index against a sequence of `len` elements
pub(crate) fn normalize_index(
    index: &Value,
    len: usize,
    kind: &str,
    location: SourceLocation,
) -> Result<usize, RuntimeError> {
    let Some(i) = index.as_int() else {
        return Err(RuntimeError::type_error(
            format!(
                "{} indices must be integers or slices, not {}",
                kind,
                index.type_name()
            ),
            location,
        ));
    };

    let len = len as i64;
    let resolved = if i < 0 { i + len } else { i };
    if resolved < 0 || resolved >= len {
        return Err(RuntimeError::index_error(
            format!("{} index out of range", kind),
            location,
        ));
    }
    Ok(resolved as usize)
}

/// `container[key]`
pub(crate) fn get_item(
    container: &Value,
    key: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            Ok(items[normalize_index(key, items.len(), "list", location)?].clone())
        }
        Value::Tuple(items) => {
            Ok(items[normalize_index(key, items.len(), "tuple", location)?].clone())
        }
        Value::Str(s) => {
            let len = s.chars().count();
            let i = normalize_index(key, len, "string", location)?;
            Ok(s.chars().nth(i).map(|c| Value::Str(c.to_string())).unwrap_or_default())
        }
        Value::Dict(entries) => {
            check_hashable(key, location)?;
            let entries = entries.borrow();
            dict_lookup(&entries, key)
                .map(|i| entries[i].1.clone())
                .ok_or_else(|| missing_key(key, location))
        }
        Value::Range { start, stop, step } => {
            let len = range_len(*start, *stop, *step);
            let i = normalize_index(key, len as usize, "range object", location)?;
            Ok(Value::Int(
                (*start as i128 + i as i128 * *step as i128) as i64,
            ))
        }
        other => Err(RuntimeError::type_error(
            format!("'{}' object is not subscriptable", other.type_name()),
            location,
        )),
    }
}

/// `container[key] = value`. Lists and dicts are shared handles, so the
/// update is visible through every name bound to `container`.
pub(crate) fn set_item(
    container: &Value,
    key: Value,
    value: Value,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    match container {
        Value::List(items) => {
            let Some(i) = key.as_int() else {
                return Err(RuntimeError::type_error(
                    format!(
                        "list indices must be integers or slices, not {}",
                        key.type_name()
                    ),
                    location,
                ));
            };
            let mut items = items.borrow_mut();
            let len = items.len() as i64;
            let resolved = if i < 0 { i + len } else { i };
            if resolved < 0 || resolved >= len {
                return Err(RuntimeError::index_error(
                    "list assignment index out of range",
                    location,
                ));
            }
            items[resolved as usize] = value;
            Ok(())
        }
        Value::Dict(entries) => {
            check_hashable(&key, location)?;
            let mut entries = entries.borrow_mut();
            match dict_lookup(&entries, &key) {
                Some(i) => entries[i].1 = value,
                None => entries.push((key, value)),
            }
            Ok(())
        }
        other => Err(RuntimeError::type_error(
            format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ),
            location,
        )),
    }
}

/// Clamp optional slice bounds against `len`, Python style
pub(crate) fn slice_bounds(len: usize, lower: Option<i64>, upper: Option<i64>) -> (usize, usize) {
    let len = len as i64;
    let clamp = |bound: i64| -> usize {
        let resolved = if bound < 0 { bound + len } else { bound };
        resolved.clamp(0, len) as usize
    };
    let lo = lower.map_or(0, clamp);
    let hi = upper.map_or(len as usize, clamp);
    (lo, hi.max(lo))
}

/// `container[lower:upper]`
pub(crate) fn get_slice(
    container: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let (lo, hi) = slice_bounds(items.len(), lower, upper);
            Ok(Value::list(items[lo..hi].to_vec()))
        }
        Value::Tuple(items) => {
            let (lo, hi) = slice_bounds(items.len(), lower, upper);
            Ok(Value::Tuple(items[lo..hi].to_vec()))
        }
        Value::Str(s) => {
            let (lo, hi) = slice_bounds(s.chars().count(), lower, upper);
            Ok(Value::Str(s.chars().skip(lo).take(hi - lo).collect()))
        }
        Value::Range { start, stop, step } => {
            let len = range_len(*start, *stop, *step);
            let (lo, hi) = slice_bounds(len as usize, lower, upper);
            let at = |i: usize| (*start as i128 + i as i128 * *step as i128) as i64;
            Ok(Value::Range {
                start: at(lo),
                stop: at(hi),
                step: *step,
            })
        }
        other => Err(RuntimeError::type_error(
            format!("'{}' object is not subscriptable", other.type_name()),
            location,
        )),
    }
}

/// `container[lower:upper] = value` (lists only)
pub(crate) fn set_slice(
    container: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    value: Value,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let Value::List(items) = container else {
        return Err(RuntimeError::type_error(
            format!(
                "'{}' object does not support slice assignment",
                container.type_name()
            ),
            location,
        ));
    };
    // Materialised first: the replacement may be the list itself
    let replacement = iterate_values(&value, location)?;
    let mut items = items.borrow_mut();
    let (lo, hi) = slice_bounds(items.len(), lower, upper);
    items.splice(lo..hi, replacement);
    Ok(())
}

/// Membership test `item in container`
pub(crate) fn contains(
    container: &Value,
    item: &Value,
    location: SourceLocation,
) -> Result<bool, RuntimeError> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(RuntimeError::type_error(
                format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ),
                location,
            )),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| v.equals(item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| v.equals(item))),
        Value::Dict(entries) => {
            check_hashable(item, location)?;
            Ok(dict_lookup(&entries.borrow(), item).is_some())
        }
        Value::Range { start, stop, step } => {
            let Some(n) = (match item {
                Value::Float(x) if x.fract() == 0.0 => Some(*x as i64),
                other => other.as_int(),
            }) else {
                return Ok(false);
            };
            let (start, stop, step) = (*start as i128, *stop as i128, *step as i128);
            let n = n as i128;
            let in_bounds = if step > 0 {
                start <= n && n < stop
            } else {
                stop < n && n <= start
            };
            Ok(step != 0 && in_bounds && (n - start) % step == 0)
        }
        other => Err(RuntimeError::type_error(
            format!("argument of type '{}' is not iterable", other.type_name()),
            location,
        )),
    }
}

pub(crate) fn is_iterable(value: &Value) -> bool {
    matches!(
        value,
        Value::Str(_) | Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Range { .. }
    )
}

/// Materialise the elements an iteration over `value` would produce.
/// Dicts yield their keys and strings their characters.
pub(crate) fn iterate_values(
    value: &Value,
    location: SourceLocation,
) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Tuple(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(entries) => Ok(entries.borrow().iter().map(|(k, _)| k.clone()).collect()),
        Value::Range { start, stop, step } => {
            let len = range_len(*start, *stop, *step);
            if len as u64 > MAX_SEQUENCE_LENGTH as u64 {
                return Err(RuntimeError::Overflow {
                    message: format!("range of {} elements is too large to materialise", len),
                    location,
                });
            }
            Ok((0..len)
                .map(|i| Value::Int((*start as i128 + i as i128 * *step as i128) as i64))
                .collect())
        }
        other => Err(RuntimeError::type_error(
            format!("'{}' object is not iterable", other.type_name()),
            location,
        )),
    }
}

pub(crate) fn check_hashable(key: &Value, location: SourceLocation) -> Result<(), RuntimeError> {
    if key.is_hashable() {
        Ok(())
    } else {
        Err(RuntimeError::type_error(
            format!("unhashable type: '{}'", key.type_name()),
            location,
        ))
    }
}

fn missing_key(key: &Value, location: SourceLocation) -> RuntimeError {
    RuntimeError::MissingKey {
        key: key.repr(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn ints(values: &[i64]) -> Value {
        Value::list(values.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_negative_indexing() {
        let list = ints(&[10, 20, 30]);
        assert_eq!(get_item(&list, &Value::Int(-1), loc()), Ok(Value::Int(30)));
        let err = get_item(&list, &Value::Int(3), loc()).unwrap_err();
        assert_eq!(err.describe(), "IndexError: list index out of range");
    }

    #[test]
    fn test_string_and_range_indexing() {
        let s = Value::Str("héllo".to_string());
        assert_eq!(get_item(&s, &Value::Int(1), loc()), Ok(Value::Str("é".to_string())));
        let range = Value::Range {
            start: 0,
            stop: 10,
            step: 3,
        };
        assert_eq!(get_item(&range, &Value::Int(-1), loc()), Ok(Value::Int(9)));
    }

    #[test]
    fn test_dict_access() {
        let dict = Value::dict(vec![]);
        set_item(&dict, Value::Str("a".into()), Value::Int(1), loc()).unwrap();
        set_item(&dict, Value::Str("a".into()), Value::Int(2), loc()).unwrap();
        assert_eq!(dict.repr(), "{'a': 2}");
        let err = get_item(&dict, &Value::Str("b".into()), loc()).unwrap_err();
        assert_eq!(err.describe(), "KeyError: 'b'");
        let err = set_item(&dict, Value::list(vec![]), Value::None, loc()).unwrap_err();
        assert_eq!(err.to_string(), "unhashable type: 'list'");
    }

    #[test]
    fn test_slices() {
        let list = ints(&[0, 1, 2, 3, 4]);
        assert_eq!(get_slice(&list, Some(1), Some(3), loc()), Ok(ints(&[1, 2])));
        assert_eq!(get_slice(&list, Some(-2), None, loc()), Ok(ints(&[3, 4])));
        assert_eq!(get_slice(&list, Some(4), Some(1), loc()), Ok(ints(&[])));
        let s = Value::Str("hello".to_string());
        assert_eq!(get_slice(&s, None, Some(2), loc()), Ok(Value::Str("he".to_string())));
    }

    #[test]
    fn test_slice_assignment() {
        let list = ints(&[0, 1, 2, 3]);
        set_slice(&list, Some(1), Some(3), ints(&[9]), loc()).unwrap();
        assert_eq!(list, ints(&[0, 9, 3]));

        // Assigning a list into a slice of itself
        let list = ints(&[1, 2]);
        set_slice(&list, Some(2), None, list.clone(), loc()).unwrap();
        assert_eq!(list, ints(&[1, 2, 1, 2]));
    }

    #[test]
    fn test_tuple_items_are_read_only() {
        let tuple = Value::Tuple(vec![Value::Int(1)]);
        let err = set_item(&tuple, Value::Int(0), Value::Int(2), loc()).unwrap_err();
        assert_eq!(err.to_string(), "'tuple' object does not support item assignment");
    }

    #[test]
    fn test_range_membership() {
        let range = Value::Range {
            start: 0,
            stop: 10,
            step: 2,
        };
        assert_eq!(contains(&range, &Value::Int(4), loc()), Ok(true));
        assert_eq!(contains(&range, &Value::Int(5), loc()), Ok(false));
        assert_eq!(contains(&range, &Value::Int(10), loc()), Ok(false));
        let down = Value::Range {
            start: 5,
            stop: 0,
            step: -1,
        };
        assert_eq!(contains(&down, &Value::Int(5), loc()), Ok(true));
    }

    #[test]
    fn test_iterate_dict_yields_keys() {
        let dict = Value::dict(vec![(Value::Str("k".into()), Value::Int(1))]);
        assert_eq!(
            iterate_values(&dict, loc()),
            Ok(vec![Value::Str("k".into())])
        );
        assert!(iterate_values(&Value::Int(3), loc()).is_err());
    }
}

//! Method calls on builtin value types
//!
//! Lists and dicts are shared handles, so a mutating method updates the
//! object every name bound to it sees. No borrow of the receiver is held
//! while elements are compared, since an element may be the receiver itself.
//!
//! | type  | methods |
//! |-------|---------|
//! | list  | `append pop insert extend remove index count clear reverse sort copy` |
//! | tuple | `index count` |
//! | str   | `upper lower strip lstrip rstrip split join replace startswith endswith find count isdigit isalpha` |
//! | dict  | `get keys values items pop clear update copy` |

use crate::interpreter::builtins::sort_values;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::{check_hashable, iterate_values};
use crate::memory::value::{dict_lookup, DictRef, ListRef, Value};
use crate::parser::ast::SourceLocation;

pub(crate) fn call_method(
    receiver: &Value,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let accepts_reverse = matches!(receiver, Value::List(_)) && method == "sort";
    if let Some((key, _)) = kwargs
        .iter()
        .find(|(key, _)| !(accepts_reverse && key == "reverse"))
    {
        let message = if accepts_reverse {
            format!("'{}' is an invalid keyword argument for sort()", key)
        } else {
            format!("{}() takes no keyword arguments", method)
        };
        return Err(RuntimeError::type_error(message, location));
    }

    let type_name = receiver.type_name();
    let result = match receiver {
        Value::List(items) => list_method(items, method, args, &kwargs, location)?,
        Value::Tuple(items) => tuple_method(items, method, args, location)?,
        Value::Str(s) => str_method(s, method, args, location)?,
        Value::Dict(entries) => dict_method(entries, method, args, location)?,
        _ => None,
    };

    result.ok_or_else(|| RuntimeError::MissingAttribute {
        type_name,
        attribute: method.to_string(),
        location,
    })
}

fn arity(
    method: &str,
    args: &[Value],
    min: usize,
    max: usize,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let given = args.len();
    let message = if min == max && given != min {
        match min {
            0 => format!("{}() takes no arguments ({} given)", method, given),
            1 => format!("{}() takes exactly one argument ({} given)", method, given),
            n => format!("{} expected {} arguments, got {}", method, n, given),
        }
    } else if given < min {
        format!("{} expected at least {} argument, got {}", method, min, given)
    } else if given > max {
        format!("{} expected at most {} arguments, got {}", method, max, given)
    } else {
        return Ok(());
    };
    Err(RuntimeError::type_error(message, location))
}

fn int_arg(value: &Value, location: SourceLocation) -> Result<i64, RuntimeError> {
    value.as_int().ok_or_else(|| {
        RuntimeError::type_error(
            format!("'{}' object cannot be interpreted as an integer", value.type_name()),
            location,
        )
    })
}

fn str_arg<'v>(
    method: &str,
    value: &'v Value,
    location: SourceLocation,
) -> Result<&'v str, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::type_error(
            format!("{}() argument must be str, not {}", method, other.type_name()),
            location,
        )),
    }
}

fn position_of(items: &[Value], needle: &Value) -> Option<usize> {
    items.iter().position(|item| item.equals(needle))
}

fn count_of(items: &[Value], needle: &Value) -> Value {
    Value::Int(items.iter().filter(|item| item.equals(needle)).count() as i64)
}

fn list_method(
    items: &ListRef,
    method: &str,
    mut args: Vec<Value>,
    kwargs: &[(String, Value)],
    location: SourceLocation,
) -> Result<Option<Value>, RuntimeError> {
    let value = match method {
        "append" => {
            arity(method, &args, 1, 1, location)?;
            items.borrow_mut().extend(args.pop());
            Value::None
        }
        "extend" => {
            arity(method, &args, 1, 1, location)?;
            let extra = iterate_values(&args[0], location)?;
            items.borrow_mut().extend(extra);
            Value::None
        }
        "insert" => {
            arity(method, &args, 2, 2, location)?;
            let index = int_arg(&args[0], location)?;
            let value = args.pop().unwrap_or_default();
            let mut items = items.borrow_mut();
            let len = items.len() as i64;
            let index = if index < 0 { (index + len).max(0) } else { index.min(len) };
            items.insert(index as usize, value);
            Value::None
        }
        "pop" => {
            arity(method, &args, 0, 1, location)?;
            let index = match args.first() {
                Some(index) => int_arg(index, location)?,
                None => -1,
            };
            let mut items = items.borrow_mut();
            if items.is_empty() {
                return Err(RuntimeError::index_error("pop from empty list", location));
            }
            let len = items.len() as i64;
            let resolved = if index < 0 { index + len } else { index };
            if !(0..len).contains(&resolved) {
                return Err(RuntimeError::index_error("pop index out of range", location));
            }
            items.remove(resolved as usize)
        }
        "remove" => {
            arity(method, &args, 1, 1, location)?;
            let found = position_of(&items.borrow(), &args[0]);
            let Some(i) = found else {
                return Err(RuntimeError::value_error(
                    "list.remove(x): x not in list",
                    location,
                ));
            };
            items.borrow_mut().remove(i);
            Value::None
        }
        "index" => {
            arity(method, &args, 1, 1, location)?;
            let found = position_of(&items.borrow(), &args[0]);
            match found {
                Some(i) => Value::Int(i as i64),
                None => {
                    return Err(RuntimeError::value_error(
                        format!("{} is not in list", args[0].repr()),
                        location,
                    ))
                }
            }
        }
        "count" => {
            arity(method, &args, 1, 1, location)?;
            count_of(&items.borrow(), &args[0])
        }
        "clear" => {
            arity(method, &args, 0, 0, location)?;
            items.borrow_mut().clear();
            Value::None
        }
        "reverse" => {
            arity(method, &args, 0, 0, location)?;
            items.borrow_mut().reverse();
            Value::None
        }
        "sort" => {
            arity(method, &args, 0, 0, location)?;
            let reverse = kwargs
                .iter()
                .rev()
                .find(|(key, _)| key == "reverse")
                .is_some_and(|(_, value)| value.is_truthy());
            // Sorted on a copy: comparing elements may borrow the list again
            let mut sorted = items.borrow().clone();
            sort_values(&mut sorted, reverse, location)?;
            *items.borrow_mut() = sorted;
            Value::None
        }
        "copy" => {
            arity(method, &args, 0, 0, location)?;
            Value::list(items.borrow().clone())
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn tuple_method(
    items: &[Value],
    method: &str,
    args: Vec<Value>,
    location: SourceLocation,
) -> Result<Option<Value>, RuntimeError> {
    let value = match method {
        "index" => {
            arity(method, &args, 1, 1, location)?;
            match position_of(items, &args[0]) {
                Some(i) => Value::Int(i as i64),
                None => {
                    return Err(RuntimeError::value_error(
                        "tuple.index(x): x not in tuple",
                        location,
                    ))
                }
            }
        }
        "count" => {
            arity(method, &args, 1, 1, location)?;
            count_of(items, &args[0])
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn strip_chars<'s>(s: &'s str, chars: Option<&str>, left: bool, right: bool) -> &'s str {
    let matches = |c: char| match chars {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    };
    let s = if left { s.trim_start_matches(matches) } else { s };
    if right {
        s.trim_end_matches(matches)
    } else {
        s
    }
}

fn str_method(
    s: &str,
    method: &str,
    args: Vec<Value>,
    location: SourceLocation,
) -> Result<Option<Value>, RuntimeError> {
    let text = |t: &str| Value::Str(t.to_string());
    let value = match method {
        "upper" => {
            arity(method, &args, 0, 0, location)?;
            Value::Str(s.to_uppercase())
        }
        "lower" => {
            arity(method, &args, 0, 0, location)?;
            Value::Str(s.to_lowercase())
        }
        "strip" | "lstrip" | "rstrip" => {
            arity(method, &args, 0, 1, location)?;
            let chars = match args.first() {
                None | Some(Value::None) => None,
                Some(value) => Some(str_arg(method, value, location)?),
            };
            text(strip_chars(s, chars, method != "rstrip", method != "lstrip"))
        }
        "split" => {
            arity(method, &args, 0, 2, location)?;
            let maxsplit = match args.get(1) {
                Some(value) => int_arg(value, location)?,
                None => -1,
            };
            let limit = if maxsplit < 0 {
                usize::MAX
            } else {
                maxsplit as usize + 1
            };
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::None) => split_whitespace(s, limit),
                Some(value) => {
                    let sep = str_arg(method, value, location)?;
                    if sep.is_empty() {
                        return Err(RuntimeError::value_error("empty separator", location));
                    }
                    s.splitn(limit, sep).map(text).collect()
                }
            };
            Value::list(parts)
        }
        "join" => {
            arity(method, &args, 1, 1, location)?;
            let pieces = iterate_values(&args[0], location)?;
            let mut joined = Vec::with_capacity(pieces.len());
            for (i, piece) in pieces.iter().enumerate() {
                match piece {
                    Value::Str(p) => joined.push(p.as_str()),
                    other => {
                        return Err(RuntimeError::type_error(
                            format!(
                                "sequence item {}: expected str instance, {} found",
                                i,
                                other.type_name()
                            ),
                            location,
                        ))
                    }
                }
            }
            Value::Str(joined.join(s))
        }
        "replace" => {
            arity(method, &args, 2, 2, location)?;
            let old = str_arg(method, &args[0], location)?;
            let new = str_arg(method, &args[1], location)?;
            Value::Str(s.replace(old, new))
        }
        "startswith" | "endswith" => {
            arity(method, &args, 1, 1, location)?;
            let affix = str_arg(method, &args[0], location)?;
            Value::Bool(if method == "startswith" {
                s.starts_with(affix)
            } else {
                s.ends_with(affix)
            })
        }
        "find" => {
            arity(method, &args, 1, 1, location)?;
            let needle = str_arg(method, &args[0], location)?;
            // Character index, not byte offset
            Value::Int(
                s.find(needle)
                    .map(|byte| s[..byte].chars().count() as i64)
                    .unwrap_or(-1),
            )
        }
        "count" => {
            arity(method, &args, 1, 1, location)?;
            let needle = str_arg(method, &args[0], location)?;
            let count = if needle.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(needle).count()
            };
            Value::Int(count as i64)
        }
        "isdigit" => {
            arity(method, &args, 0, 0, location)?;
            Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        }
        "isalpha" => {
            arity(method, &args, 0, 0, location)?;
            Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic))
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn split_whitespace(s: &str, limit: usize) -> Vec<Value> {
    let mut parts = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if parts.len() + 1 == limit {
            parts.push(Value::Str(rest.trim_end().to_string()));
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        parts.push(Value::Str(rest[..end].to_string()));
        rest = rest[end..].trim_start();
    }
    parts
}

fn dict_method(
    entries: &DictRef,
    method: &str,
    args: Vec<Value>,
    location: SourceLocation,
) -> Result<Option<Value>, RuntimeError> {
    let value = match method {
        "get" => {
            arity(method, &args, 1, 2, location)?;
            check_hashable(&args[0], location)?;
            let entries = entries.borrow();
            match dict_lookup(&entries, &args[0]) {
                Some(i) => entries[i].1.clone(),
                None => args.get(1).cloned().unwrap_or_default(),
            }
        }
        "keys" => {
            arity(method, &args, 0, 0, location)?;
            Value::list(entries.borrow().iter().map(|(k, _)| k.clone()).collect())
        }
        "values" => {
            arity(method, &args, 0, 0, location)?;
            Value::list(entries.borrow().iter().map(|(_, v)| v.clone()).collect())
        }
        "items" => {
            arity(method, &args, 0, 0, location)?;
            Value::list(
                entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            )
        }
        "pop" => {
            arity(method, &args, 1, 2, location)?;
            check_hashable(&args[0], location)?;
            let mut entries = entries.borrow_mut();
            match (dict_lookup(&entries, &args[0]), args.get(1)) {
                (Some(i), _) => entries.remove(i).1,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(RuntimeError::MissingKey {
                        key: args[0].repr(),
                        location,
                    })
                }
            }
        }
        "clear" => {
            arity(method, &args, 0, 0, location)?;
            entries.borrow_mut().clear();
            Value::None
        }
        "update" => {
            arity(method, &args, 1, 1, location)?;
            let Value::Dict(other) = &args[0] else {
                return Err(RuntimeError::type_error(
                    format!("'{}' object is not a mapping", args[0].type_name()),
                    location,
                ));
            };
            let incoming = other.borrow().clone();
            let mut entries = entries.borrow_mut();
            for (key, value) in incoming {
                match dict_lookup(&entries, &key) {
                    Some(i) => entries[i].1 = value,
                    None => entries.push((key, value)),
                }
            }
            Value::None
        }
        "copy" => {
            arity(method, &args, 0, 0, location)?;
            Value::dict(entries.borrow().clone())
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    fn call(receiver: &Value, method: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        call_method(receiver, method, args, Vec::new(), loc())
    }

    #[test]
    fn test_list_mutators() {
        let xs = Value::list(vec![Value::Int(3), Value::Int(1)]);
        call(&xs, "append", vec![Value::Int(2)]).unwrap();
        call(&xs, "insert", vec![Value::Int(0), Value::Int(9)]).unwrap();
        assert_eq!(xs.repr(), "[9, 3, 1, 2]");
        assert_eq!(call(&xs, "pop", vec![]).unwrap(), Value::Int(2));
        assert_eq!(call(&xs, "pop", vec![Value::Int(0)]).unwrap(), Value::Int(9));
        call(&xs, "extend", vec![s("ab")]).unwrap();
        assert_eq!(xs.repr(), "[3, 1, 'a', 'b']");
        call(&xs, "remove", vec![s("a")]).unwrap();
        call(&xs, "reverse", vec![]).unwrap();
        assert_eq!(xs.repr(), "['b', 1, 3]");
    }

    #[test]
    fn test_list_sort_with_reverse() {
        let xs = Value::list(vec![Value::Int(2), Value::Int(5), Value::Int(1)]);
        call_method(
            &xs,
            "sort",
            vec![],
            vec![("reverse".to_string(), Value::Bool(true))],
            loc(),
        )
        .unwrap();
        assert_eq!(xs.repr(), "[5, 2, 1]");
    }

    #[test]
    fn test_list_errors() {
        let empty = Value::list(vec![]);
        assert_eq!(
            call(&empty, "pop", vec![]).unwrap_err().describe(),
            "IndexError: pop from empty list"
        );
        assert_eq!(
            call(&empty, "index", vec![Value::Int(4)]).unwrap_err().describe(),
            "ValueError: 4 is not in list"
        );
        assert_eq!(
            call(&empty, "push", vec![]).unwrap_err().describe(),
            "AttributeError: 'list' object has no attribute 'push'"
        );
        assert_eq!(
            call_method(&empty, "append", vec![Value::Int(1)], vec![("x".to_string(), Value::None)], loc())
                .unwrap_err()
                .describe(),
            "TypeError: append() takes no keyword arguments"
        );
    }

    #[test]
    fn test_string_methods() {
        let text = s("  Hello World  ");
        assert_eq!(call(&text, "strip", vec![]).unwrap(), s("Hello World"));
        assert_eq!(
            call(&text, "split", vec![]).unwrap().repr(),
            "['Hello', 'World']"
        );
        assert_eq!(call(&text, "find", vec![s("World")]).unwrap(), Value::Int(8));
        assert_eq!(text, s("  Hello World  "));

        let csv = s("a,b,,c");
        assert_eq!(
            call(&csv, "split", vec![s(",")]).unwrap().repr(),
            "['a', 'b', '', 'c']"
        );
        let sep = s("-");
        let joined = call(&sep, "join", vec![Value::list(vec![s("x"), s("y")])]).unwrap();
        assert_eq!(joined, s("x-y"));
        assert!(call(&sep, "join", vec![Value::list(vec![Value::Int(1)])]).is_err());
    }

    #[test]
    fn test_dict_methods() {
        let d = Value::dict(vec![(s("a"), Value::Int(1)), (s("b"), Value::Int(2))]);
        assert_eq!(call(&d, "get", vec![s("z"), Value::Int(0)]).unwrap(), Value::Int(0));
        assert_eq!(call(&d, "items", vec![]).unwrap().repr(), "[('a', 1), ('b', 2)]");
        assert_eq!(call(&d, "pop", vec![s("a")]).unwrap(), Value::Int(1));
        assert_eq!(
            call(&d, "pop", vec![s("a")]).unwrap_err().describe(),
            "KeyError: 'a'"
        );
        assert_eq!(d.repr(), "{'b': 2}");
    }

    #[test]
    fn test_list_methods_with_self_reference() {
        let xs = Value::list(vec![Value::Int(1), Value::Int(2)]);
        call(&xs, "extend", vec![xs.clone()]).unwrap();
        assert_eq!(xs.repr(), "[1, 2, 1, 2]");

        call(&xs, "append", vec![xs.clone()]).unwrap();
        assert_eq!(xs.repr(), "[1, 2, 1, 2, [...]]");
        assert_eq!(call(&xs, "count", vec![xs.clone()]).unwrap(), Value::Int(1));
        call(&xs, "remove", vec![xs.clone()]).unwrap();
        assert_eq!(xs.repr(), "[1, 2, 1, 2]");

        let d = Value::dict(vec![(s("a"), Value::Int(1))]);
        call(&d, "update", vec![d.clone()]).unwrap();
        assert_eq!(d.repr(), "{'a': 1}");
    }

    #[test]
    fn test_unknown_method_on_int() {
        let n = Value::Int(1);
        assert_eq!(
            call(&n, "append", vec![]).unwrap_err().describe(),
            "AttributeError: 'int' object has no attribute 'append'"
        );
    }
}

//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all runtime values
//! of the scripting language. Values are tagged and dynamically typed.
//!
//! # Value Types
//!
//! - [`Value::None`]: the `None` singleton
//! - [`Value::Bool`], [`Value::Int`] (64-bit, checked), [`Value::Float`]
//! - [`Value::Str`]: immutable text
//! - [`Value::List`], [`Value::Tuple`]: sequences of values
//! - [`Value::Dict`]: insertion-ordered mapping with hashable keys
//! - [`Value::Range`]: lazy arithmetic progression
//!
//! # Reference Semantics
//!
//! Lists and dicts are shared handles: cloning a [`Value`] clones the handle,
//! so `b = a` makes both names see every later `a.append(..)`. Tuples,
//! strings and numbers are immutable and are copied freely.
//!
//! [`Value::deep_copy`] detaches a value from the live heap. Snapshots and
//! step attempts are built from deep copies taken with one [`CopyMemo`], so
//! aliasing between bindings (and self-referencing lists) survives the copy.
//! A reference cycle is never freed; a run is short lived and reset drops
//! everything else.
//!
//! # Sizes
//!
//! [`Value::estimated_size`] reports the shallow footprint a 64-bit CPython
//! would report for an equivalent object. It is a teaching aid for the memory
//! pane, not an account of this process's allocations.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Shared, mutable list storage
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable dict storage: insertion ordered key -> value pairs
pub type DictRef = Rc<RefCell<Vec<(Value, Value)>>>;

/// Copies already made during one deep copy, keyed by the source handle's
/// address
pub type CopyMemo = FxHashMap<usize, Value>;

/// Nesting depth past which structural equality and ordering give up
const MAX_COMPARE_DEPTH: usize = 256;

/// Runtime values in the interpreter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(ListRef),
    Tuple(Vec<Value>),
    Dict(DictRef),
    Range { start: i64, stop: i64, step: i64 },
}

impl Value {
    /// A new list holding `items`
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// A new dict holding `entries`, which must have distinct keys
    pub fn dict(entries: Vec<(Value, Value)>) -> Value {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    /// Language-level type name (`int`, `str`, ...)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
        }
    }

    /// Lossless representation, as the `repr()` builtin shows it
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        out
    }

    /// `active` holds the containers currently being printed; meeting one
    /// again prints `[...]` or `{...}` instead of recursing
    fn write_repr(&self, out: &mut String, active: &mut Vec<usize>) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(x) => out.push_str(&format_float(*x)),
            Value::Str(s) => out.push_str(&quote_str(s)),
            Value::List(items) => {
                let id = Rc::as_ptr(items) as usize;
                if active.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                active.push(id);
                out.push('[');
                write_items(&items.borrow(), out, active);
                out.push(']');
                active.pop();
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(items, out, active);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(entries) => {
                let id = Rc::as_ptr(entries) as usize;
                if active.contains(&id) {
                    out.push_str("{...}");
                    return;
                }
                active.push(id);
                out.push('{');
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out, active);
                    out.push_str(": ");
                    value.write_repr(out, active);
                }
                out.push('}');
                active.pop();
            }
            Value::Range { start, stop, step } => {
                if *step == 1 {
                    out.push_str(&format!("range({}, {})", start, stop));
                } else {
                    out.push_str(&format!("range({}, {}, {})", start, stop, step));
                }
            }
        }
    }

    /// Text produced by `str()` and `print()`
    pub fn to_display(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// Truth value used by conditions and boolean operators
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.borrow().is_empty(),
            Value::Range { start, stop, step } => range_len(*start, *stop, *step) > 0,
        }
    }

    /// Whether the value may be used as a dict key
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Integer view of ints and bools
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float view of any number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            other => other.as_int().map(|n| n as f64),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    /// Language-level equality (`==`): numbers compare across int, float and
    /// bool; containers compare element-wise; dicts ignore order. A list or
    /// dict always equals itself.
    pub fn equals(&self, other: &Value) -> bool {
        self.equals_at(other, 0)
    }

    fn equals_at(&self, other: &Value, depth: usize) -> bool {
        if depth > MAX_COMPARE_DEPTH {
            return false;
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || items_equal(&a.borrow(), &b.borrow(), depth)
            }
            (Value::Tuple(a), Value::Tuple(b)) => items_equal(a, b, depth),
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        dict_lookup(&b, k).is_some_and(|i| b[i].1.equals_at(v, depth + 1))
                    })
            }
            (
                Value::Range {
                    start: s1,
                    stop: e1,
                    step: st1,
                },
                Value::Range {
                    start: s2,
                    stop: e2,
                    step: st2,
                },
            ) => {
                let len = range_len(*s1, *e1, *st1);
                len == range_len(*s2, *e2, *st2)
                    && (len == 0 || (s1 == s2 && (len == 1 || st1 == st2)))
            }
            (Value::Int(a), Value::Int(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
            _ => false,
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`, `min`, `max` and `sorted`.
    /// Returns `None` when the two values are not orderable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        self.compare_at(other, 0)
    }

    fn compare_at(&self, other: &Value, depth: usize) -> Option<Ordering> {
        if depth > MAX_COMPARE_DEPTH {
            return None;
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Some(Ordering::Equal);
                }
                compare_items(&a.borrow(), &b.borrow(), depth)
            }
            (Value::Tuple(a), Value::Tuple(b)) => compare_items(a, b, depth),
            (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
            },
            _ => None,
        }
    }

    /// Shallow size in bytes, modelled on 64-bit CPython's `sys.getsizeof`
    pub fn estimated_size(&self) -> usize {
        match self {
            Value::None => 16,
            Value::Bool(false) => 24,
            Value::Bool(true) => 28,
            Value::Int(n) => int_size(*n),
            Value::Float(_) => 24,
            Value::Str(s) => str_size(s),
            Value::List(items) => 56 + 8 * items.borrow().len(),
            Value::Tuple(items) => 40 + 8 * items.len(),
            Value::Dict(entries) => dict_size(&entries.borrow()),
            Value::Range { .. } => 48,
        }
    }

    /// Recursive copy that shares nothing with `self`
    pub fn deep_copy(&self) -> Value {
        self.deep_copy_with(&mut CopyMemo::default())
    }

    /// Deep copy through `memo`, so a handle reached twice (or reached from
    /// inside itself) is copied once and the copies alias the same way
    pub fn deep_copy_with(&self, memo: &mut CopyMemo) -> Value {
        match self {
            Value::List(items) => {
                let id = Rc::as_ptr(items) as usize;
                if let Some(copy) = memo.get(&id) {
                    return copy.clone();
                }
                let fresh: ListRef = Rc::default();
                memo.insert(id, Value::List(fresh.clone()));
                let copied = items
                    .borrow()
                    .iter()
                    .map(|item| item.deep_copy_with(memo))
                    .collect();
                *fresh.borrow_mut() = copied;
                Value::List(fresh)
            }
            Value::Dict(entries) => {
                let id = Rc::as_ptr(entries) as usize;
                if let Some(copy) = memo.get(&id) {
                    return copy.clone();
                }
                let fresh: DictRef = Rc::default();
                memo.insert(id, Value::Dict(fresh.clone()));
                let copied = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.deep_copy_with(memo), v.deep_copy_with(memo)))
                    .collect();
                *fresh.borrow_mut() = copied;
                Value::Dict(fresh)
            }
            Value::Tuple(items) => {
                Value::Tuple(items.iter().map(|item| item.deep_copy_with(memo)).collect())
            }
            other => other.clone(),
        }
    }
}

fn write_items(items: &[Value], out: &mut String, active: &mut Vec<usize>) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out, active);
    }
}

fn items_equal(a: &[Value], b: &[Value], depth: usize) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals_at(y, depth + 1))
}

/// Lexicographic ordering: the first unequal pair decides, then length
fn compare_items(a: &[Value], b: &[Value], depth: usize) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b) {
        if !x.equals_at(y, depth + 1) {
            return x.compare_at(y, depth + 1);
        }
    }
    Some(a.len().cmp(&b.len()))
}

/// Python-style float formatting: shortest round-trip digits, always with a
/// decimal point or exponent
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let abs = x.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let formatted = format!("{:e}", x);
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let formatted = format!("{}", x);
    if formatted.contains('.') {
        formatted
    } else {
        format!("{}.0", formatted)
    }
}

/// Quote a string the way `repr()` does: single quotes unless the text
/// contains a single quote and no double quote
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn int_size(n: i64) -> usize {
    // CPython stores ints in 30-bit digits on top of a 24 byte header
    let magnitude = n.unsigned_abs();
    if magnitude == 0 {
        24
    } else if magnitude < 1 << 30 {
        28
    } else if magnitude < 1 << 60 {
        32
    } else {
        36
    }
}

fn str_size(s: &str) -> usize {
    let len = s.chars().count();
    match s.chars().map(|c| c as u32).max().unwrap_or(0) {
        0..=0x7f => 49 + len,
        0x80..=0xff => 73 + len,
        0x100..=0xffff => 74 + 2 * len,
        _ => 76 + 4 * len,
    }
}

fn dict_size(entries: &[(Value, Value)]) -> usize {
    const DICT_HEADER: usize = 64;
    const KEYS_HEADER: usize = 32;

    if entries.is_empty() {
        return DICT_HEADER;
    }

    let mut capacity = 8;
    while capacity * 2 / 3 < entries.len() {
        capacity *= 2;
    }
    let index_width = match capacity {
        0..=128 => 1,
        129..=32768 => 2,
        _ => 4,
    };
    let entry_width = if entries.iter().all(|(k, _)| matches!(k, Value::Str(_))) {
        16
    } else {
        24
    };

    DICT_HEADER + KEYS_HEADER + capacity * index_width + (capacity * 2 / 3) * entry_width
}

/// Number of elements produced by `range(start, stop, step)`
pub fn range_len(start: i64, stop: i64, step: i64) -> i64 {
    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let len = if step > 0 && start < stop {
        (stop - start - 1) / step + 1
    } else if step < 0 && start > stop {
        (start - stop - 1) / (-step) + 1
    } else {
        0
    };
    len.min(i64::MAX as i128) as i64
}

/// Position of `key` among dict entries, by language equality
pub fn dict_lookup(entries: &[(Value, Value)], key: &Value) -> Option<usize> {
    entries.iter().position(|(k, _)| k.equals(key))
}

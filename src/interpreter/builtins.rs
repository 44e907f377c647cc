//! Built-in function implementations
//!
//! This module provides the builtin functions of the scripting subset. They
//! are dispatched by name from [`Evaluator::call_builtin`] once every argument
//! has been evaluated.
//!
//! # Supported Built-ins
//!
//! - `print(*values, sep=' ', end='\n')`: writes to the step's output capture
//! - `range`, `len`, `min`, `max`, `sum`, `sorted`, `enumerate`, `zip`
//! - conversions: `str`, `int`, `float`, `bool`, `list`, `tuple`, `repr`
//! - numeric: `abs`, `round`
//! - `type(x)`: the class text, e.g. `<class 'int'>`
//!
//! # Implementation Notes
//!
//! - `enumerate` and `zip` return lists of tuples rather than lazy iterators
//! - `round` rounds half to even
//! - f-string format specs (`{x:>8.2f}`) are rendered by [`format_with_spec`]

use std::cmp::Ordering;

use crate::interpreter::constants::MAX_SEQUENCE_LENGTH;
use crate::interpreter::evaluator::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::iterate_values;
use crate::interpreter::ops::binary::apply_binary;
use crate::memory::value::{format_float, range_len, Value};
use crate::parser::ast::{BinOp, SourceLocation};

impl Evaluator<'_> {
    pub(crate) fn call_builtin(
        &mut self,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let allowed: &[&str] = match name {
            "print" => &["sep", "end"],
            "sorted" => &["reverse"],
            "enumerate" | "sum" => &["start"],
            "round" => &["ndigits"],
            "int" => &["base"],
            _ => &[],
        };
        for (key, _) in &kwargs {
            if !allowed.contains(&key.as_str()) {
                let message = if allowed.is_empty() {
                    format!("{}() takes no keyword arguments", name)
                } else {
                    format!("'{}' is an invalid keyword argument for {}()", key, name)
                };
                return Err(RuntimeError::type_error(message, location));
            }
        }

        match name {
            "print" => self.builtin_print(&args, &kwargs, location),
            "range" => builtin_range(&args, location),
            "len" => {
                check_arity(name, args.len(), 1, 1, location)?;
                builtin_len(&args[0], location)
            }
            "str" => {
                check_arity(name, args.len(), 0, 1, location)?;
                Ok(Value::Str(args.first().map(Value::to_display).unwrap_or_default()))
            }
            "repr" => {
                check_arity(name, args.len(), 1, 1, location)?;
                Ok(Value::Str(args[0].repr()))
            }
            "int" => builtin_int(&args, kwarg(&kwargs, "base"), location),
            "float" => {
                check_arity(name, args.len(), 0, 1, location)?;
                match args.first() {
                    Some(value) => to_float(value, location),
                    None => Ok(Value::Float(0.0)),
                }
            }
            "bool" => {
                check_arity(name, args.len(), 0, 1, location)?;
                Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
            }
            "abs" => {
                check_arity(name, args.len(), 1, 1, location)?;
                builtin_abs(&args[0], location)
            }
            "min" => builtin_extreme("min", args, Ordering::Less, location),
            "max" => builtin_extreme("max", args, Ordering::Greater, location),
            "sum" => {
                check_arity(name, args.len(), 1, 2, location)?;
                let start = kwarg(&kwargs, "start").or(args.get(1)).cloned();
                builtin_sum(&args[0], start, location)
            }
            "list" | "tuple" => {
                check_arity(name, args.len(), 0, 1, location)?;
                let items = match args.first() {
                    Some(value) => iterate_values(value, location)?,
                    None => Vec::new(),
                };
                Ok(if name == "list" {
                    Value::list(items)
                } else {
                    Value::Tuple(items)
                })
            }
            "sorted" => {
                check_arity(name, args.len(), 1, 1, location)?;
                let mut items = iterate_values(&args[0], location)?;
                let reverse = kwarg(&kwargs, "reverse").is_some_and(Value::is_truthy);
                sort_values(&mut items, reverse, location)?;
                Ok(Value::list(items))
            }
            "round" => {
                check_arity(name, args.len(), 1, 2, location)?;
                let ndigits = kwarg(&kwargs, "ndigits").or(args.get(1));
                builtin_round(&args[0], ndigits, location)
            }
            "enumerate" => {
                check_arity(name, args.len(), 1, 2, location)?;
                let start = match kwarg(&kwargs, "start").or(args.get(1)) {
                    Some(value) => as_index(value, location)?,
                    None => 0,
                };
                let items = iterate_values(&args[0], location)?;
                let mut pairs = Vec::with_capacity(items.len());
                for (offset, item) in items.into_iter().enumerate() {
                    let index = start.checked_add(offset as i64).ok_or_else(|| {
                        RuntimeError::Overflow {
                            message: "enumerate index too large".to_string(),
                            location,
                        }
                    })?;
                    pairs.push(Value::Tuple(vec![Value::Int(index), item]));
                }
                Ok(Value::list(pairs))
            }
            "zip" => {
                let columns = args
                    .iter()
                    .map(|arg| iterate_values(arg, location))
                    .collect::<Result<Vec<_>, _>>()?;
                let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
                Ok(Value::list(
                    (0..rows)
                        .map(|row| Value::Tuple(columns.iter().map(|c| c[row].clone()).collect()))
                        .collect(),
                ))
            }
            "type" => {
                check_arity(name, args.len(), 1, 1, location)?;
                Ok(Value::Str(format!("<class '{}'>", args[0].type_name())))
            }
            _ => Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                location,
            }),
        }
    }

    fn builtin_print(
        &mut self,
        args: &[Value],
        kwargs: &[(String, Value)],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let sep = string_kwarg(kwargs, "sep", " ", location)?;
        let end = string_kwarg(kwargs, "end", "\n", location)?;

        let line = args
            .iter()
            .map(Value::to_display)
            .collect::<Vec<_>>()
            .join(&sep);
        self.output.write(&line);
        self.output.write(&end);

        Ok(Value::None)
    }
}

fn kwarg<'v>(kwargs: &'v [(String, Value)], name: &str) -> Option<&'v Value> {
    kwargs.iter().rev().find(|(key, _)| key == name).map(|(_, value)| value)
}

fn string_kwarg(
    kwargs: &[(String, Value)],
    name: &str,
    default: &str,
    location: SourceLocation,
) -> Result<String, RuntimeError> {
    match kwarg(kwargs, name) {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(RuntimeError::type_error(
            format!("{} must be None or a string, not {}", name, other.type_name()),
            location,
        )),
    }
}

fn check_arity(
    name: &str,
    given: usize,
    min: usize,
    max: usize,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let message = if given < min && min == max {
        format!(
            "{}() takes exactly {} argument{} ({} given)",
            name,
            min,
            plural(min),
            given
        )
    } else if given < min {
        format!("{} expected at least {} argument{}, got {}", name, min, plural(min), given)
    } else if given > max {
        format!("{} expected at most {} argument{}, got {}", name, max, plural(max), given)
    } else {
        return Ok(());
    };
    Err(RuntimeError::type_error(message, location))
}

fn as_index(value: &Value, location: SourceLocation) -> Result<i64, RuntimeError> {
    value.as_int().ok_or_else(|| {
        RuntimeError::type_error(
            format!("'{}' object cannot be interpreted as an integer", value.type_name()),
            location,
        )
    })
}

fn builtin_range(args: &[Value], location: SourceLocation) -> Result<Value, RuntimeError> {
    check_arity("range", args.len(), 1, 3, location)?;
    let bounds = args
        .iter()
        .map(|arg| as_index(arg, location))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step, ..] => (*start, *stop, *step),
        [] => (0, 0, 1),
    };
    if step == 0 {
        return Err(RuntimeError::value_error("range() arg 3 must not be zero", location));
    }
    Ok(Value::Range { start, stop, step })
}

fn builtin_len(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    let len = match value {
        Value::Str(s) => s.chars().count() as i64,
        Value::List(items) => items.borrow().len() as i64,
        Value::Tuple(items) => items.len() as i64,
        Value::Dict(entries) => entries.borrow().len() as i64,
        Value::Range { start, stop, step } => range_len(*start, *stop, *step),
        other => {
            return Err(RuntimeError::type_error(
                format!("object of type '{}' has no len()", other.type_name()),
                location,
            ))
        }
    };
    Ok(Value::Int(len))
}

fn float_to_int(x: f64, location: SourceLocation) -> Result<Value, RuntimeError> {
    if x.is_nan() {
        return Err(RuntimeError::value_error("cannot convert float NaN to integer", location));
    }
    if x.is_infinite() {
        return Err(RuntimeError::Overflow {
            message: "cannot convert float infinity to integer".to_string(),
            location,
        });
    }
    let truncated = x.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(RuntimeError::Overflow {
            message: "int too large to convert".to_string(),
            location,
        });
    }
    Ok(Value::Int(truncated as i64))
}

fn builtin_int(
    args: &[Value],
    base: Option<&Value>,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    check_arity("int", args.len(), 0, 2, location)?;
    let base = base.or(args.get(1));
    let Some(value) = args.first() else {
        return Ok(Value::Int(0));
    };

    let radix = match base {
        None => None,
        Some(base) => {
            let radix = as_index(base, location)?;
            if !(2..=36).contains(&radix) {
                return Err(RuntimeError::value_error("int() base must be >= 2 and <= 36", location));
            }
            Some(radix as u32)
        }
    };

    match (value, radix) {
        (Value::Str(s), radix) => {
            let radix = radix.unwrap_or(10);
            let digits = s.trim().replace('_', "");
            i64::from_str_radix(&digits, radix)
                .map(Value::Int)
                .map_err(|err| match err.kind() {
                    std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                        RuntimeError::Overflow {
                            message: "int too large to convert".to_string(),
                            location,
                        }
                    }
                    _ => RuntimeError::value_error(
                        format!(
                            "invalid literal for int() with base {}: {}",
                            radix,
                            value.repr()
                        ),
                        location,
                    ),
                })
        }
        (_, Some(_)) => Err(RuntimeError::type_error(
            "int() can't convert non-string with explicit base",
            location,
        )),
        (Value::Int(n), None) => Ok(Value::Int(*n)),
        (Value::Bool(b), None) => Ok(Value::Int(i64::from(*b))),
        (Value::Float(x), None) => float_to_int(*x, location),
        (other, None) => Err(RuntimeError::type_error(
            format!(
                "int() argument must be a string or a real number, not '{}'",
                other.type_name()
            ),
            location,
        )),
    }
}

fn to_float(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    match value {
        Value::Str(s) => {
            let text = s.trim();
            text.replace('_', "")
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| {
                    RuntimeError::value_error(
                        format!("could not convert string to float: {}", value.repr()),
                        location,
                    )
                })
        }
        other => other.as_f64().map(Value::Float).ok_or_else(|| {
            RuntimeError::type_error(
                format!(
                    "float() argument must be a string or a real number, not '{}'",
                    other.type_name()
                ),
                location,
            )
        }),
    }
}

fn builtin_abs(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(n) => n.checked_abs().map(Value::Int).ok_or(RuntimeError::Overflow {
            message: "integer result too large".to_string(),
            location,
        }),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => Err(RuntimeError::type_error(
            format!("bad operand type for abs(): '{}'", other.type_name()),
            location,
        )),
    }
}

fn order(
    a: &Value,
    b: &Value,
    symbol: &str,
    location: SourceLocation,
) -> Result<Ordering, RuntimeError> {
    a.compare(b).ok_or_else(|| {
        RuntimeError::type_error(
            format!(
                "'{}' not supported between instances of '{}' and '{}'",
                symbol,
                a.type_name(),
                b.type_name()
            ),
            location,
        )
    })
}

/// `min` / `max`: the first element that no other element beats
fn builtin_extreme(
    name: &str,
    args: Vec<Value>,
    wanted: Ordering,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let candidates = match args.len() {
        0 => {
            return Err(RuntimeError::type_error(
                format!("{} expected at least 1 argument, got 0", name),
                location,
            ))
        }
        1 => iterate_values(&args[0], location)?,
        _ => args,
    };

    let symbol = if wanted == Ordering::Less { "<" } else { ">" };
    let mut candidates = candidates.into_iter();
    let Some(mut best) = candidates.next() else {
        return Err(RuntimeError::value_error(
            format!("{}() arg is an empty sequence", name),
            location,
        ));
    };
    for candidate in candidates {
        if order(&candidate, &best, symbol, location)? == wanted {
            best = candidate;
        }
    }
    Ok(best)
}

fn builtin_sum(
    iterable: &Value,
    start: Option<Value>,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let start = start.unwrap_or(Value::Int(0));
    if matches!(start, Value::Str(_)) {
        return Err(RuntimeError::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
            location,
        ));
    }
    iterate_values(iterable, location)?
        .into_iter()
        .try_fold(start, |total, item| apply_binary(BinOp::Add, total, item, location))
}

/// Stable sort by language ordering; `reverse` keeps equal elements in
/// their original order
pub(crate) fn sort_values(
    items: &mut [Value],
    reverse: bool,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let mut failure = None;
    if reverse {
        items.reverse();
    }
    items.sort_by(|a, b| match order(a, b, "<", location) {
        Ok(ordering) => ordering,
        Err(err) => {
            failure.get_or_insert(err);
            Ordering::Equal
        }
    });
    if reverse {
        items.reverse();
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn builtin_round(
    value: &Value,
    ndigits: Option<&Value>,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(n) => Some(as_index(n, location)?),
    };

    match (value, ndigits) {
        (Value::Int(_) | Value::Bool(_), None) => Ok(Value::Int(value.as_int().unwrap_or(0))),
        (Value::Int(_) | Value::Bool(_), Some(n)) => {
            let n_int = value.as_int().unwrap_or(0);
            if n >= 0 {
                return Ok(Value::Int(n_int));
            }
            if n < -18 {
                return Ok(Value::Int(0));
            }
            let unit = 10i128.pow((-n) as u32);
            let x = n_int as i128;
            let (quotient, remainder) = (x.div_euclid(unit), x.rem_euclid(unit));
            let rounded = match (remainder * 2).cmp(&unit) {
                Ordering::Less => quotient,
                Ordering::Greater => quotient + 1,
                Ordering::Equal => quotient + (quotient & 1),
            };
            i64::try_from(rounded * unit)
                .map(Value::Int)
                .map_err(|_| RuntimeError::Overflow {
                    message: "integer result too large".to_string(),
                    location,
                })
        }
        (Value::Float(x), None) => float_to_int(x.round_ties_even(), location),
        (Value::Float(x), Some(n)) => {
            if !x.is_finite() {
                return Ok(Value::Float(*x));
            }
            if n >= 0 {
                let text = format!("{:.*}", n.min(300) as usize, x);
                Ok(Value::Float(text.parse().unwrap_or(*x)))
            } else {
                let unit = 10f64.powi((-n).min(400) as i32);
                Ok(Value::Float((x / unit).round_ties_even() * unit))
            }
        }
        (other, _) => Err(RuntimeError::type_error(
            format!(
                "type {} doesn't define __round__ method",
                other.type_name()
            ),
            location,
        )),
    }
}

/// Parsed `[[fill]align][sign][0][width][,][.precision][type]`
#[derive(Debug, Default)]
struct FormatSpec {
    fill: Option<char>,
    align: Option<char>,
    sign: Option<char>,
    zero_pad: bool,
    width: usize,
    grouping: bool,
    precision: Option<usize>,
    kind: Option<char>,
}

/// Width and precision are capped like any other produced sequence, so a
/// spec such as `>100000000000` fails instead of exhausting memory
fn spec_number(
    digits: &[char],
    what: &str,
    location: SourceLocation,
) -> Result<usize, RuntimeError> {
    let digits: String = digits.iter().collect();
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_SEQUENCE_LENGTH => Ok(n),
        _ => Err(RuntimeError::Overflow {
            message: format!("{} too large in format specifier", what),
            location,
        }),
    }
}

fn parse_spec(spec: &str, location: SourceLocation) -> Result<FormatSpec, RuntimeError> {
    let invalid = || RuntimeError::value_error("Invalid format specifier", location);
    let chars: Vec<char> = spec.chars().collect();
    let mut parsed = FormatSpec::default();
    let mut i = 0;

    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
    if chars.len() >= 2 && is_align(chars[1]) {
        parsed.fill = Some(chars[0]);
        parsed.align = Some(chars[1]);
        i = 2;
    } else if chars.first().copied().is_some_and(is_align) {
        parsed.align = Some(chars[0]);
        i = 1;
    }

    if let Some(&c @ ('+' | '-' | ' ')) = chars.get(i) {
        parsed.sign = Some(c);
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        parsed.zero_pad = true;
        i += 1;
    }

    let width_start = i;
    while chars.get(i).is_some_and(char::is_ascii_digit) {
        i += 1;
    }
    if i > width_start {
        parsed.width = spec_number(&chars[width_start..i], "width", location)?;
    }

    if chars.get(i) == Some(&',') {
        parsed.grouping = true;
        i += 1;
    }

    if chars.get(i) == Some(&'.') {
        i += 1;
        let precision_start = i;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
        if i == precision_start {
            return Err(invalid());
        }
        parsed.precision = Some(spec_number(&chars[precision_start..i], "precision", location)?);
    }

    if let Some(&c) = chars.get(i) {
        parsed.kind = Some(c);
        i += 1;
    }
    if i != chars.len() {
        return Err(invalid());
    }
    Ok(parsed)
}

fn group_thousands(digits: &str) -> String {
    let (int_part, rest) = match digits.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) => digits.split_at(pos),
        None => (digits, ""),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + rest.len());
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push_str(rest);
    grouped
}

fn fixed(x: f64, precision: usize) -> String {
    if x.is_finite() {
        format!("{:.*}", precision, x)
    } else {
        format_float(x)
    }
}

fn exponent(x: f64, precision: usize, upper: bool) -> String {
    if !x.is_finite() {
        return format_float(x);
    }
    let formatted = format!("{:.*e}", precision, x);
    let (mantissa, exp) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:02}", mantissa, e, sign, exp.abs())
}

/// General format: fixed or scientific by magnitude, trailing zeros dropped
fn general(x: f64, precision: usize) -> String {
    if !x.is_finite() {
        return format_float(x);
    }
    let precision = precision.max(1);
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let probe = format!("{:.*e}", precision - 1, x);
    let exp: i32 = probe
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    let strip = |s: String| {
        if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            s
        }
    };
    if exp < -4 || exp >= precision as i32 {
        let formatted = exponent(x, precision - 1, false);
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((&formatted, ""));
        format!("{}e{}", strip(mantissa.to_string()), exp)
    } else {
        strip(format!("{:.*}", (precision as i32 - 1 - exp).max(0) as usize, x))
    }
}

/// Render `value` the way an f-string replacement field `{value:spec}` does
pub(crate) fn format_with_spec(
    value: &Value,
    spec: &str,
    location: SourceLocation,
) -> Result<String, RuntimeError> {
    if spec.is_empty() {
        return Ok(value.to_display());
    }
    let spec = parse_spec(spec, location)?;
    let unknown_code = |code: char| {
        RuntimeError::value_error(
            format!(
                "Unknown format code '{}' for object of type '{}'",
                code,
                value.type_name()
            ),
            location,
        )
    };

    let (body, numeric) = match (value, spec.kind) {
        (Value::Str(s), None | Some('s')) => {
            let body = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.clone(),
            };
            (body, false)
        }
        (Value::Str(_), Some(code)) => return Err(unknown_code(code)),

        (Value::Int(_) | Value::Bool(_), None | Some('d')) => {
            let n = value.as_int().unwrap_or(0);
            if spec.precision.is_some() {
                return Err(RuntimeError::value_error(
                    "Precision not allowed in integer format specifier",
                    location,
                ));
            }
            (n.to_string(), true)
        }
        (Value::Int(_) | Value::Bool(_), Some(code @ ('x' | 'X' | 'o' | 'b'))) => {
            let n = value.as_int().unwrap_or(0);
            let magnitude = n.unsigned_abs();
            let digits = match code {
                'x' => format!("{:x}", magnitude),
                'X' => format!("{:X}", magnitude),
                'o' => format!("{:o}", magnitude),
                _ => format!("{:b}", magnitude),
            };
            (if n < 0 { format!("-{}", digits) } else { digits }, true)
        }

        (
            Value::Int(_) | Value::Bool(_) | Value::Float(_),
            Some(code @ ('f' | 'F' | 'e' | 'E' | 'g' | 'G' | '%')),
        ) => {
            let x = value.as_f64().unwrap_or(0.0);
            let precision = spec.precision.unwrap_or(6);
            let body = match code {
                'f' | 'F' => fixed(x, precision),
                'e' | 'E' => exponent(x, precision, code == 'E'),
                '%' => format!("{}%", fixed(x * 100.0, precision)),
                _ => general(x, precision),
            };
            let body = if code.is_ascii_uppercase() {
                body.to_uppercase()
            } else {
                body
            };
            (body, true)
        }
        (Value::Float(x), None) => {
            let body = match spec.precision {
                Some(p) => general(*x, p),
                None => format_float(*x),
            };
            (body, true)
        }
        (Value::Int(_) | Value::Bool(_) | Value::Float(_), Some(code)) => {
            return Err(unknown_code(code))
        }

        (other, _) => {
            return Err(RuntimeError::type_error(
                format!("unsupported format string passed to {}.__format__", other.type_name()),
                location,
            ))
        }
    };

    let (sign, digits) = match body.strip_prefix('-') {
        Some(rest) if numeric => ("-", rest.to_string()),
        _ if numeric => (
            match spec.sign {
                Some('+') => "+",
                Some(' ') => " ",
                _ => "",
            },
            body,
        ),
        _ => ("", body),
    };
    let digits = if spec.grouping && numeric {
        group_thousands(&digits)
    } else {
        digits
    };

    let content_len = sign.chars().count() + digits.chars().count();
    let padding = spec.width.saturating_sub(content_len);
    let (fill, align) = match (spec.fill, spec.align) {
        (fill, Some(align)) => (fill.unwrap_or(' '), align),
        (None, None) if spec.zero_pad && numeric => ('0', '='),
        _ => (' ', if numeric { '>' } else { '<' }),
    };
    let pad = |n: usize| fill.to_string().repeat(n);

    Ok(match align {
        '<' => format!("{}{}{}", sign, digits, pad(padding)),
        '^' => format!(
            "{}{}{}{}",
            pad(padding / 2),
            sign,
            digits,
            pad(padding - padding / 2)
        ),
        '=' => format!("{}{}{}", sign, pad(padding), digits),
        _ => format!("{}{}{}", pad(padding), sign, digits),
    })
}

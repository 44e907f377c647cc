//! Memory model for the scripting language
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: Runtime value representation (None, numbers, strings, containers)
//! - [`environment`]: The variable bindings that persist across steps
//!
//! # Sizes
//!
//! Sizes shown in the memory pane come from [`value::Value::estimated_size`]
//! and follow a 64-bit CPython layout:
//! - `int`: 28 bytes for small magnitudes, growing by 4 per 30-bit digit
//! - `float`: 24 bytes
//! - `str`: 49 bytes of header plus one byte per ASCII character
//! - `list`/`tuple`: header plus one 8-byte slot per element (shallow)

pub mod environment;
pub mod value;

pub use environment::Environment;
pub use value::Value;

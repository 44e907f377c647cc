//! Stepping interpreter for the scripting subset
//!
//! This module provides the execution logic:
//! - [`engine`]: run lifecycle (start, step, reset) and the cumulative transcript
//! - [`step`]: one unit of execution, a line or a whole block
//! - [`evaluator`]: tree-walking evaluator for parsed fragments
//! - [`errors`]: runtime, syntax and engine error types
//!
//! # Execution Model
//!
//! Each step parses the current line (or the block it opens) as a fragment
//! and evaluates it against a working copy of the environment. The copy is
//! committed only when the whole fragment succeeds, so every step is atomic.
//!
//! # Built-in Functions
//!
//! Builtins (`print`, `range`, `len`, ...) and the methods of `list`, `str`,
//! `tuple` and `dict` are implemented directly in the evaluator.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod step;

mod builtins;
mod expressions;
mod loops;
mod methods;
mod ops;
mod statements;

pub use engine::{Engine, EngineConfig};
pub use errors::{EngineError, RuntimeError, SyntaxError};

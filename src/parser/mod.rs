//! Script source parser
//!
//! This module transforms script text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens, including INDENT/DEDENT)
//! - [`parser`]: Parsing (tokens → AST)
//! - [`ast`]: AST node definitions
//!
//! # Supported Subset
//!
//! - Statements: expressions, assignment (chained, tuple unpacking,
//!   subscript targets), augmented assignment, `if`/`elif`/`else`, `while`,
//!   `for`, `break`, `continue`, `pass`
//! - Expressions: arithmetic, comparisons (chained, `in`, `is`), boolean
//!   operators, conditional expressions, builtin calls, method calls,
//!   indexing and slicing, list/tuple/dict displays, f-strings
//! - No user functions, classes, imports, exceptions or comprehensions
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one function per precedence level.
//! Whole programs are parsed in strict mode; fragments cut out of a program
//! (a single stripped line or a segmented block) use relative indentation.

pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use parser::{parse_fragment, parse_program, ParseError};
